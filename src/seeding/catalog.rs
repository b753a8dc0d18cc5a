//! Fixed value pools the synthesizer draws from.

/// (city, state, zip)
pub const CITIES: &[(&str, &str, &str)] = &[
    ("Dallas", "TX", "75201"),
    ("Houston", "TX", "77002"),
    ("San Antonio", "TX", "78205"),
    ("Atlanta", "GA", "30303"),
    ("Savannah", "GA", "31401"),
    ("Chicago", "IL", "60601"),
    ("Joliet", "IL", "60431"),
    ("Memphis", "TN", "38103"),
    ("Nashville", "TN", "37203"),
    ("Phoenix", "AZ", "85004"),
    ("Tucson", "AZ", "85701"),
    ("Denver", "CO", "80202"),
    ("Kansas City", "MO", "64105"),
    ("St. Louis", "MO", "63101"),
    ("Columbus", "OH", "43215"),
    ("Cincinnati", "OH", "45202"),
    ("Indianapolis", "IN", "46204"),
    ("Louisville", "KY", "40202"),
    ("Charlotte", "NC", "28202"),
    ("Raleigh", "NC", "27601"),
    ("Jacksonville", "FL", "32202"),
    ("Orlando", "FL", "32801"),
    ("Miami", "FL", "33130"),
    ("Los Angeles", "CA", "90012"),
    ("Fresno", "CA", "93721"),
    ("Sacramento", "CA", "95814"),
    ("Salt Lake City", "UT", "84101"),
    ("Seattle", "WA", "98104"),
    ("Portland", "OR", "97204"),
    ("Oklahoma City", "OK", "73102"),
    ("Omaha", "NE", "68102"),
    ("Minneapolis", "MN", "55401"),
    ("Laredo", "TX", "78040"),
    ("El Paso", "TX", "79901"),
    ("Albuquerque", "NM", "87102"),
    ("Birmingham", "AL", "35203"),
];

pub const STATE_CODES: &[&str] = &[
    "AL", "AZ", "AR", "CA", "CO", "FL", "GA", "IA", "IL", "IN", "KS", "KY", "LA", "MI", "MN", "MO",
    "MS", "NC", "NE", "NM", "NV", "OH", "OK", "OR", "PA", "SC", "TN", "TX", "UT", "VA", "WA", "WI",
];

pub const COMPANY_NAMES: &[&str] = &[
    "Lone Star Freight Lines",
    "Great Plains Carriers",
    "Blue Ridge Transport",
    "Pacific Crest Logistics",
    "Heartland Express Haulers",
    "Gulf Coast Trucking",
    "Midwest Motor Freight",
    "Summit Line Transport",
];

pub const DIVISION_NAMES: &[&str] = &["Dry Van", "Regional", "Dedicated", "Intermodal"];

pub const DEPARTMENT_NAMES: &[&str] = &["Operations", "Dispatch", "Maintenance", "Safety"];

pub const FIRST_NAMES: &[&str] = &[
    "James", "Maria", "Robert", "Linda", "Michael", "Patricia", "William", "Jennifer", "David",
    "Elizabeth", "Carlos", "Susan", "Joseph", "Jessica", "Thomas", "Sarah", "Charles", "Karen",
    "Daniel", "Nancy", "Anthony", "Lisa", "Marcus", "Angela", "Jose", "Brenda", "Kevin", "Tanya",
];

pub const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Wilson", "Anderson", "Thomas", "Taylor", "Moore", "Jackson",
    "Martin", "Lee", "Thompson", "White", "Harris", "Clark", "Lewis", "Walker", "Young", "King",
];

pub const SHIPPERS: &[&str] = &[
    "Acme Distribution",
    "Sunbelt Foods",
    "Northwind Paper Co.",
    "Keystone Building Supply",
    "Prairie Grain Cooperative",
    "Harbor Beverage Group",
    "Redline Auto Parts",
    "Evergreen Home Goods",
    "Summit Plastics",
    "Riverbend Steel",
];

pub const CONSIGNEES: &[&str] = &[
    "Metro Grocery DC",
    "Valley Retail Warehouse",
    "Central Hardware Depot",
    "Coastal Wholesale",
    "Tri-State Distribution Center",
    "Mountain View Markets",
    "Lakeside Fulfillment",
    "Capitol Supply Hub",
];

pub const COMMODITIES: &[&str] = &[
    "Dry Groceries",
    "Paper Products",
    "Building Materials",
    "Beverages",
    "Auto Parts",
    "Household Goods",
    "Plastics",
    "Packaged Foods",
    "Electronics",
    "Furniture",
];

pub const STREET_NAMES: &[&str] = &[
    "Industrial Blvd",
    "Commerce Dr",
    "Freight Way",
    "Logistics Pkwy",
    "Terminal Rd",
    "Distribution Ave",
];

/// (manufacturer, models, weight out of 100)
pub const MANUFACTURERS: &[(&str, &[&str], u32)] = &[
    ("Freightliner", &["Cascadia", "Cascadia Evolution", "M2 106"], 80),
    ("Kenworth", &["T680", "W900", "T880"], 10),
    ("Peterbilt", &["579", "389", "567"], 5),
    ("Volvo", &["VNL 760", "VNL 860", "VNR 640"], 5),
];

pub const RELATIONSHIPS: &[&str] = &["Spouse", "Parent", "Sibling", "Friend"];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn manufacturer_weights_sum_to_hundred() {
        let total: u32 = MANUFACTURERS.iter().map(|(_, _, w)| w).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn city_pool_has_unique_entries_and_prefixes() {
        let names: HashSet<_> = CITIES.iter().map(|(c, _, _)| *c).collect();
        assert_eq!(names.len(), CITIES.len());
        assert!(CITIES.iter().all(|(c, s, _)| c.len() >= 3 && s.len() == 2));
    }
}
