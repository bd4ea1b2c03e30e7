//! Small deterministic faker
//!
//! Person names, street names and zip codes drawn from fixed word lists
//! through a `RandomStream`.

use super::rng::RandomStream;

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas",
    "Sarah", "Christopher", "Karen", "Daniel", "Lisa", "Matthew", "Nancy", "Anthony", "Betty",
    "Mark", "Sandra", "Steven", "Ashley", "Andrew", "Kimberly", "Joshua", "Emily", "Kevin",
    "Donna", "Brian", "Michelle", "Carlos", "Maria", "Luis", "Ana", "Jorge", "Sofia", "Wei",
    "Mei", "Hiroshi", "Yuki", "Omar", "Fatima", "Andre", "Aaliyah", "Tyler", "Megan", "Ryan",
    "Rachel", "Jason", "Amanda", "Derek", "Priya", "Raj", "Olivia", "Ethan", "Chloe", "Noah",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White", "Harris", "Sanchez",
    "Clark", "Ramirez", "Lewis", "Robinson", "Walker", "Young", "Allen", "King", "Wright",
    "Scott", "Torres", "Nguyen", "Hill", "Flores", "Green", "Adams", "Nelson", "Baker", "Hall",
    "Rivera", "Campbell", "Mitchell", "Carter", "Roberts", "Chen", "Kim", "Patel", "Tanaka",
    "Okafor", "Murphy", "Cooper", "Reed", "Bailey", "Foster",
];

const STREET_NAMES: &[&str] = &[
    "Oak", "Maple", "Cedar", "Pine", "Elm", "Walnut", "Chestnut", "Spruce", "Willow", "Birch",
    "Lincoln", "Washington", "Jefferson", "Madison", "Franklin", "Jackson", "Adams", "Monroe",
    "Highland", "Lake", "Hill", "River", "Park", "Sunset", "Meadow", "Spring", "Church",
    "Mill", "Union", "Grant", "Hamilton", "Liberty", "Prospect", "Summit", "Valley", "Forest",
    "Harbor", "Bridge", "Orchard", "Cherry",
];

/// Street suffixes used in addresses
pub const STREET_SUFFIXES: &[&str] = &["St", "Ave", "Blvd", "Dr", "Rd", "Way", "Pl"];

/// `"First Last"`
pub fn person_name(rng: &mut RandomStream) -> String {
    let first = rng.pick(FIRST_NAMES).copied().unwrap_or("Alex");
    let last = rng.pick(LAST_NAMES).copied().unwrap_or("Doe");
    format!("{} {}", first, last)
}

/// Street name without a suffix, e.g. `"Maple"`
pub fn street_word(rng: &mut RandomStream) -> String {
    rng.pick(STREET_NAMES).copied().unwrap_or("Main").to_string()
}

/// Street name with a suffix, e.g. `"Maple Ave"`
pub fn street_name(rng: &mut RandomStream) -> String {
    let word = street_word(rng);
    let suffix = rng.pick(STREET_SUFFIXES).copied().unwrap_or("St");
    format!("{} {}", word, suffix)
}

/// Five-digit zip code starting with `prefix`
pub fn zipcode(rng: &mut RandomStream, prefix: &str) -> String {
    let mut zip: String = prefix.chars().filter(|c| c.is_ascii_digit()).take(5).collect();
    while zip.len() < 5 {
        let digit = rng.int_between(0, 9);
        zip.push_str(&digit.to_string());
    }
    zip
}
