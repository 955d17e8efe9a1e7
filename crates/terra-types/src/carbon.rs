/// kg CO2 per km travelled.
pub const TRANSPORT_FACTOR: f64 = 0.2;
/// kg CO2 per kg of food.
pub const FOOD_FACTOR: f64 = 1.5;
/// kg CO2 per kWh.
pub const ENERGY_FACTOR: f64 = 0.5;

/// Emission factor for a category. Unknown categories pass the raw value through.
pub fn emission_factor(category: &str) -> f64 {
    match category {
        "transport" => TRANSPORT_FACTOR,
        "food" => FOOD_FACTOR,
        "energy" => ENERGY_FACTOR,
        _ => 1.0,
    }
}

/// Derived emissions for a logged quantity. This is the only way an entry's
/// `calculated_emissions` is produced.
pub fn calculate_emissions(category: &str, value: f64) -> f64 {
    value * emission_factor(category)
}
