//! Builds fully populated drafts for every seeded entity.
//!
//! Nothing here touches the database. Randomness comes from the caller's RNG
//! and every date is derived from the reference time given at construction, so
//! a fixed seed and a fixed reference time reproduce the same drafts.

use super::allocator::company_for_partition;
use super::catalog::{
    CITIES, COMMODITIES, COMPANY_NAMES, CONSIGNEES, DEPARTMENT_NAMES, DIVISION_NAMES, FIRST_NAMES,
    LAST_NAMES, MANUFACTURERS, RELATIONSHIPS, SHIPPERS, STREET_NAMES,
};
use super::identity::IdentityEncoder;
use crate::entities::{company, department, division, driver, load, terminal, trailer, truck};
use crate::errors::ServiceError;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use serde::Serialize;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum TruckStatus {
    Active,
    Available,
    InShop,
    OutOfService,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum DriverStatus {
    Available,
    OnDuty,
    OffDuty,
    OnLeave,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum DriverType {
    CompanyDriver,
    OwnerOperator,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum TrailerStatus {
    Active,
    Available,
    InShop,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum LoadStatus {
    Open,
    Covered,
    InTransit,
    Delivered,
}

const TRUCK_STATUS_WEIGHTS: &[(TruckStatus, u32)] = &[
    (TruckStatus::Active, 55),
    (TruckStatus::Available, 25),
    (TruckStatus::InShop, 12),
    (TruckStatus::OutOfService, 8),
];

const DRIVER_STATUS_WEIGHTS: &[(DriverStatus, u32)] = &[
    (DriverStatus::Available, 40),
    (DriverStatus::OnDuty, 35),
    (DriverStatus::OffDuty, 20),
    (DriverStatus::OnLeave, 5),
];

const TRAILER_STATUS_WEIGHTS: &[(TrailerStatus, u32)] = &[
    (TrailerStatus::Active, 60),
    (TrailerStatus::Available, 30),
    (TrailerStatus::InShop, 10),
];

const OWNER_OPERATOR_PROBABILITY: f64 = 0.10;
const OPEN_LOAD_PROBABILITY: f64 = 0.10;

/// Terminal and company a fleet row belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrgAssignment {
    pub terminal_id: i32,
    pub company_id: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct CompanyDraft {
    pub code: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct DivisionDraft {
    pub code: String,
    pub name: String,
    pub company_code: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct DepartmentDraft {
    pub code: String,
    pub name: String,
    pub division_code: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct TerminalDraft {
    pub code: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: String,
    pub company_code: String,
    pub department_code: Option<String>,
}

/// The whole organization hierarchy, parents before children.
#[derive(Clone, Debug, Default, Serialize)]
pub struct OrganizationDraft {
    pub companies: Vec<CompanyDraft>,
    pub divisions: Vec<DivisionDraft>,
    pub departments: Vec<DepartmentDraft>,
    /// Ordered by partition index
    pub terminals: Vec<TerminalDraft>,
}

#[derive(Clone, Debug)]
pub struct NewTruck {
    pub truck_number: String,
    pub vin: String,
    pub manufacturer: String,
    pub model: String,
    pub model_year: i32,
    pub is_automatic: bool,
    pub status: TruckStatus,
    pub mileage: i32,
    pub maintenance_due_date: NaiveDate,
    pub registration_expiry: NaiveDate,
    pub insurance_expiry: NaiveDate,
    pub org: OrgAssignment,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewDriver {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub license_number: String,
    pub license_state: String,
    pub license_expiry: NaiveDate,
    pub status: DriverStatus,
    pub driver_type: DriverType,
    pub hire_date: NaiveDate,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub org: OrgAssignment,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewTrailer {
    pub trailer_number: String,
    pub trailer_type: String,
    pub length_ft: i32,
    pub capacity_lbs: i32,
    pub year: i32,
    pub status: TrailerStatus,
    pub last_inspection_date: NaiveDate,
    pub next_inspection_date: NaiveDate,
    pub org: OrgAssignment,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewLoad {
    pub load_number: String,
    pub shipper: String,
    pub consignee: String,
    pub origin_city: String,
    pub origin_state: String,
    pub destination_city: String,
    pub destination_state: String,
    pub commodity: String,
    pub pickup_at: DateTime<Utc>,
    pub delivery_at: DateTime<Utc>,
    pub rate: Decimal,
    pub distance_miles: i32,
    pub weight_lbs: i32,
    pub status: LoadStatus,
    pub org: OrgAssignment,
    pub created_at: DateTime<Utc>,
}

/// Produces drafts relative to a fixed reference time.
#[derive(Clone, Copy, Debug)]
pub struct EntitySynthesizer {
    now: DateTime<Utc>,
}

impl EntitySynthesizer {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn reference_time(&self) -> DateTime<Utc> {
        self.now
    }

    fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// Companies, their divisions and departments, and `terminal_count`
    /// terminals spread over the companies in contiguous blocks.
    pub fn organization<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        company_count: usize,
        terminal_count: usize,
        divisions_per_company: usize,
        departments_per_division: usize,
    ) -> Result<OrganizationDraft, ServiceError> {
        let mut draft = OrganizationDraft::default();
        let mut departments_by_company: Vec<Vec<String>> = vec![Vec::new(); company_count];

        for c in 0..company_count {
            let code = format!("CO{:02}", c + 1);
            let base_name = COMPANY_NAMES[c % COMPANY_NAMES.len()];
            let name = if c < COMPANY_NAMES.len() {
                base_name.to_string()
            } else {
                format!("{base_name} {}", c / COMPANY_NAMES.len() + 1)
            };
            let (city, state, zip) = CITIES[rng.gen_range(0..CITIES.len())];
            draft.companies.push(CompanyDraft {
                address: street_address(rng, city, state, zip),
                phone: phone_number(rng),
                email: format!("dispatch@{}.com", slug(&name)),
                code: code.clone(),
                name,
            });

            for d in 0..divisions_per_company {
                let division_code = format!("{code}-D{}", d + 1);
                draft.divisions.push(DivisionDraft {
                    code: division_code.clone(),
                    name: format!("{} Division", DIVISION_NAMES[d % DIVISION_NAMES.len()]),
                    company_code: code.clone(),
                });

                for p in 0..departments_per_division {
                    let department_code = format!("{division_code}-P{}", p + 1);
                    departments_by_company[c].push(department_code.clone());
                    draft.departments.push(DepartmentDraft {
                        code: department_code,
                        name: DEPARTMENT_NAMES[p % DEPARTMENT_NAMES.len()].to_string(),
                        division_code: division_code.clone(),
                    });
                }
            }
        }

        let mut cities: Vec<&(&str, &str, &str)> = CITIES.iter().collect();
        cities.shuffle(rng);
        let mut terminals_seen = vec![0usize; company_count];

        for i in 1..=terminal_count {
            let company_index = company_for_partition(i, terminal_count, company_count)? - 1;
            let &(city, state, zip) = cities[(i - 1) % cities.len()];
            let departments = &departments_by_company[company_index];
            let department_code = (!departments.is_empty())
                .then(|| departments[terminals_seen[company_index] % departments.len()].clone());
            terminals_seen[company_index] += 1;

            draft.terminals.push(TerminalDraft {
                code: format!("{}{:02}", city_prefix(city), i),
                name: format!("{city} Terminal"),
                address: street_address(rng, city, state, zip),
                city: city.to_string(),
                state: state.to_string(),
                zip: zip.to_string(),
                phone: phone_number(rng),
                company_code: draft.companies[company_index].code.clone(),
                department_code,
            });
        }

        Ok(draft)
    }

    pub fn truck<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        encoder: &mut IdentityEncoder,
        org: OrgAssignment,
    ) -> NewTruck {
        let (manufacturer, models) = pick_manufacturer(rng);
        let model = models.choose(rng).copied().unwrap_or(manufacturer);
        let model_year = rng.gen_range(2005..=2024);
        let is_automatic = rng.gen_bool(automatic_probability(model_year));

        let age = i64::from((self.now.year() - model_year).max(0));
        let per_year: i64 = rng.gen_range(60_000..=120_000);
        let mileage = (age * per_year).max(5_000);

        let today = self.today();
        NewTruck {
            truck_number: encoder.next_truck_number(model_year, is_automatic),
            vin: encoder.vin(rng),
            manufacturer: manufacturer.to_string(),
            model: model.to_string(),
            model_year,
            is_automatic,
            status: weighted(rng, TRUCK_STATUS_WEIGHTS),
            mileage: i32::try_from(mileage).unwrap_or(i32::MAX),
            maintenance_due_date: today + Duration::days(rng.gen_range(1..=90)),
            registration_expiry: today + Duration::days(rng.gen_range(30..=365)),
            insurance_expiry: today + Duration::days(rng.gen_range(30..=365)),
            org,
            created_at: self.now,
        }
    }

    pub fn driver<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        encoder: &mut IdentityEncoder,
        org: OrgAssignment,
    ) -> NewDriver {
        let first_name = pick(rng, FIRST_NAMES);
        let last_name = pick(rng, LAST_NAMES);
        let (license_state, license_number) = encoder.license(rng);
        let driver_type = if rng.gen_bool(OWNER_OPERATOR_PROBABILITY) {
            DriverType::OwnerOperator
        } else {
            DriverType::CompanyDriver
        };
        let contact_first = pick(rng, FIRST_NAMES);
        let relationship = pick(rng, RELATIONSHIPS);
        let today = self.today();

        NewDriver {
            email: format!(
                "{}.{}{}@drivers.example.com",
                first_name.to_lowercase(),
                last_name.to_lowercase(),
                rng.gen_range(10..1000)
            ),
            phone: phone_number(rng),
            license_number,
            license_state,
            license_expiry: today + Duration::days(rng.gen_range(90..=1460)),
            status: weighted(rng, DRIVER_STATUS_WEIGHTS),
            driver_type,
            hire_date: today - Duration::days(rng.gen_range(365..=15 * 365)),
            emergency_contact_name: format!("{contact_first} {last_name} ({relationship})"),
            emergency_contact_phone: phone_number(rng),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            org,
            created_at: self.now,
        }
    }

    pub fn trailer<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        encoder: &mut IdentityEncoder,
        org: OrgAssignment,
    ) -> NewTrailer {
        let last_inspection_date = self.today() - Duration::days(rng.gen_range(0..=365));
        NewTrailer {
            trailer_number: encoder.next_trailer_number(),
            trailer_type: "Dry Van".to_string(),
            length_ft: 53,
            capacity_lbs: rng.gen_range(40_000..=45_000),
            year: rng.gen_range(2010..=2024),
            status: weighted(rng, TRAILER_STATUS_WEIGHTS),
            last_inspection_date,
            next_inspection_date: last_inspection_date + Duration::days(365),
            org,
            created_at: self.now,
        }
    }

    /// One load picked up inside the month starting at `month_start`. The
    /// status is the pre-quota proposal.
    pub fn load<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        encoder: &mut IdentityEncoder,
        month_start: NaiveDate,
        org: OrgAssignment,
    ) -> NewLoad {
        let origin = rng.gen_range(0..CITIES.len());
        let mut destination = rng.gen_range(0..CITIES.len() - 1);
        if destination >= origin {
            destination += 1;
        }
        let (origin_city, origin_state, _) = CITIES[origin];
        let (destination_city, destination_state, _) = CITIES[destination];

        let day = rng.gen_range(0..days_in_month(month_start));
        let minute = rng.gen_range(0..24 * 60);
        let pickup_at = Utc.from_utc_datetime(&month_start.and_time(NaiveTime::default()))
            + Duration::days(day)
            + Duration::minutes(minute);
        let delivery_at = pickup_at + Duration::days(rng.gen_range(1..=5));

        let distance_miles: i32 = rng.gen_range(100..=2500);
        let per_mile: f64 = rng.gen_range(1.85..3.25);
        let accessorial: f64 = rng.gen_range(50.0..250.0);
        let cents = ((f64::from(distance_miles) * per_mile + accessorial) * 100.0).round() as i64;

        let status = if rng.gen_bool(OPEN_LOAD_PROBABILITY) {
            LoadStatus::Open
        } else {
            LoadStatus::Covered
        };

        NewLoad {
            load_number: encoder.next_load_number(month_start),
            shipper: pick(rng, SHIPPERS).to_string(),
            consignee: pick(rng, CONSIGNEES).to_string(),
            origin_city: origin_city.to_string(),
            origin_state: origin_state.to_string(),
            destination_city: destination_city.to_string(),
            destination_state: destination_state.to_string(),
            commodity: pick(rng, COMMODITIES).to_string(),
            pickup_at,
            delivery_at,
            rate: Decimal::new(cents, 2),
            distance_miles,
            weight_lbs: rng.gen_range(10_000..=45_000),
            status,
            org,
            created_at: self.now,
        }
    }
}

/// Probability that a truck of the given model year has an automatic transmission.
pub fn automatic_probability(model_year: i32) -> f64 {
    match model_year {
        y if y >= 2018 => 0.90,
        2012..=2017 => 0.60,
        _ => 0.25,
    }
}

/// First day of the month `offset` months after `start`.
pub fn month_start(start: NaiveDate, offset: u32) -> Option<NaiveDate> {
    start
        .with_day(1)?
        .checked_add_months(Months::new(offset))
}

pub fn days_in_month(month_start: NaiveDate) -> i64 {
    match month_start.checked_add_months(Months::new(1)) {
        Some(next) => (next - month_start).num_days(),
        None => 28,
    }
}

fn pick_manufacturer<R: Rng + ?Sized>(rng: &mut R) -> (&'static str, &'static [&'static str]) {
    let total: u32 = MANUFACTURERS.iter().map(|(_, _, w)| w).sum();
    let mut roll = rng.gen_range(0..total);
    for (name, models, weight) in MANUFACTURERS {
        if roll < *weight {
            return (*name, *models);
        }
        roll -= weight;
    }
    (MANUFACTURERS[0].0, MANUFACTURERS[0].1)
}

fn weighted<R: Rng + ?Sized, T: Copy>(rng: &mut R, table: &[(T, u32)]) -> T {
    let total: u32 = table.iter().map(|(_, w)| w).sum();
    let mut roll = rng.gen_range(0..total);
    for (value, weight) in table {
        if roll < *weight {
            return *value;
        }
        roll -= weight;
    }
    table[0].0
}

fn pick<R: Rng + ?Sized>(rng: &mut R, pool: &[&'static str]) -> &'static str {
    pool[rng.gen_range(0..pool.len())]
}

fn phone_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "({}) {}-{:04}",
        rng.gen_range(201..990),
        rng.gen_range(200..1000),
        rng.gen_range(0..10_000)
    )
}

fn street_address<R: Rng + ?Sized>(rng: &mut R, city: &str, state: &str, zip: &str) -> String {
    format!(
        "{} {}, {city}, {state} {zip}",
        rng.gen_range(100..9999),
        pick(rng, STREET_NAMES)
    )
}

fn city_prefix(city: &str) -> String {
    city.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect::<String>()
        .to_ascii_uppercase()
}

fn slug(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

impl CompanyDraft {
    pub fn into_active_model(self, now: DateTime<Utc>) -> company::ActiveModel {
        company::ActiveModel {
            name: Set(self.name),
            code: Set(self.code),
            address: Set(self.address),
            phone: Set(self.phone),
            email: Set(self.email),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }
}

impl DivisionDraft {
    pub fn into_active_model(self, company_id: i32, now: DateTime<Utc>) -> division::ActiveModel {
        division::ActiveModel {
            name: Set(self.name),
            code: Set(self.code),
            company_id: Set(company_id),
            created_at: Set(now),
            ..Default::default()
        }
    }
}

impl DepartmentDraft {
    pub fn into_active_model(
        self,
        division_id: i32,
        now: DateTime<Utc>,
    ) -> department::ActiveModel {
        department::ActiveModel {
            name: Set(self.name),
            code: Set(self.code),
            division_id: Set(division_id),
            created_at: Set(now),
            ..Default::default()
        }
    }
}

impl TerminalDraft {
    pub fn into_active_model(
        self,
        company_id: i32,
        department_id: Option<i32>,
        now: DateTime<Utc>,
    ) -> terminal::ActiveModel {
        terminal::ActiveModel {
            name: Set(self.name),
            code: Set(self.code),
            address: Set(self.address),
            city: Set(self.city),
            state: Set(self.state),
            zip: Set(self.zip),
            phone: Set(self.phone),
            company_id: Set(company_id),
            department_id: Set(department_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }
}

impl From<NewTruck> for truck::ActiveModel {
    fn from(t: NewTruck) -> Self {
        truck::ActiveModel {
            vin: Set(t.vin),
            manufacturer: Set(t.manufacturer),
            model: Set(t.model),
            model_year: Set(t.model_year),
            status: Set(t.status.to_string()),
            mileage: Set(t.mileage),
            created_at: Set(t.created_at),
            truck_number: Set(Some(t.truck_number)),
            is_automatic: Set(Some(t.is_automatic)),
            maintenance_due_date: Set(Some(t.maintenance_due_date)),
            registration_expiry: Set(Some(t.registration_expiry)),
            insurance_expiry: Set(Some(t.insurance_expiry)),
            terminal_id: Set(Some(t.org.terminal_id)),
            company_id: Set(Some(t.org.company_id)),
            ..Default::default()
        }
    }
}

impl From<NewDriver> for driver::ActiveModel {
    fn from(d: NewDriver) -> Self {
        driver::ActiveModel {
            first_name: Set(d.first_name),
            last_name: Set(d.last_name),
            phone: Set(d.phone),
            email: Set(d.email),
            license_number: Set(d.license_number),
            license_expiry: Set(d.license_expiry),
            status: Set(d.status.to_string()),
            created_at: Set(d.created_at),
            license_state: Set(Some(d.license_state)),
            driver_type: Set(Some(d.driver_type.to_string())),
            hire_date: Set(Some(d.hire_date)),
            emergency_contact_name: Set(Some(d.emergency_contact_name)),
            emergency_contact_phone: Set(Some(d.emergency_contact_phone)),
            terminal_id: Set(Some(d.org.terminal_id)),
            company_id: Set(Some(d.org.company_id)),
            ..Default::default()
        }
    }
}

impl From<NewTrailer> for trailer::ActiveModel {
    fn from(t: NewTrailer) -> Self {
        trailer::ActiveModel {
            trailer_number: Set(t.trailer_number),
            trailer_type: Set(t.trailer_type),
            length_ft: Set(t.length_ft),
            capacity_lbs: Set(t.capacity_lbs),
            year: Set(t.year),
            status: Set(t.status.to_string()),
            last_inspection_date: Set(t.last_inspection_date),
            next_inspection_date: Set(t.next_inspection_date),
            terminal_id: Set(Some(t.org.terminal_id)),
            company_id: Set(Some(t.org.company_id)),
            created_at: Set(t.created_at),
            ..Default::default()
        }
    }
}

impl From<NewLoad> for load::ActiveModel {
    fn from(l: NewLoad) -> Self {
        load::ActiveModel {
            load_number: Set(l.load_number),
            shipper: Set(l.shipper),
            consignee: Set(l.consignee),
            origin_city: Set(l.origin_city),
            origin_state: Set(l.origin_state),
            destination_city: Set(l.destination_city),
            destination_state: Set(l.destination_state),
            commodity: Set(l.commodity),
            pickup_at: Set(l.pickup_at),
            delivery_at: Set(l.delivery_at),
            rate: Set(l.rate),
            status: Set(l.status.to_string()),
            created_at: Set(l.created_at),
            distance_miles: Set(Some(l.distance_miles)),
            weight_lbs: Set(Some(l.weight_lbs)),
            terminal_id: Set(Some(l.org.terminal_id)),
            company_id: Set(Some(l.org.company_id)),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    const ORG: OrgAssignment = OrgAssignment {
        terminal_id: 4,
        company_id: 1,
    };

    fn synthesizer() -> EntitySynthesizer {
        EntitySynthesizer::new(Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap())
    }

    #[test]
    fn trucks_stay_within_ranges() {
        let synth = synthesizer();
        let mut rng = StdRng::seed_from_u64(1);
        let mut encoder = IdentityEncoder::new();
        let today = synth.today();

        for _ in 0..500 {
            let t = synth.truck(&mut rng, &mut encoder, ORG);
            assert!((2005..=2024).contains(&t.model_year));
            assert!(t.mileage >= 5_000);
            assert_eq!(t.truck_number.ends_with('A'), t.is_automatic);
            assert!(t.maintenance_due_date > today);
            assert!(t.maintenance_due_date <= today + Duration::days(90));
            assert!(t.registration_expiry >= today + Duration::days(30));
            assert!(MANUFACTURERS.iter().any(|(m, _, _)| *m == t.manufacturer));
        }
    }

    #[test]
    fn manufacturer_mix_favours_freightliner() {
        let synth = synthesizer();
        let mut rng = StdRng::seed_from_u64(2);
        let mut encoder = IdentityEncoder::new();
        let freightliner = (0..1_000)
            .filter(|_| synth.truck(&mut rng, &mut encoder, ORG).manufacturer == "Freightliner")
            .count();
        assert!((700..=900).contains(&freightliner), "got {freightliner}");
    }

    #[test]
    fn automatic_probability_by_era() {
        assert_eq!(automatic_probability(2024), 0.90);
        assert_eq!(automatic_probability(2018), 0.90);
        assert_eq!(automatic_probability(2017), 0.60);
        assert_eq!(automatic_probability(2012), 0.60);
        assert_eq!(automatic_probability(2011), 0.25);
    }

    #[test]
    fn drivers_and_trailers_have_consistent_dates() {
        let synth = synthesizer();
        let mut rng = StdRng::seed_from_u64(3);
        let mut encoder = IdentityEncoder::new();
        let today = synth.today();

        for _ in 0..200 {
            let d = synth.driver(&mut rng, &mut encoder, ORG);
            assert!(d.hire_date <= today - Duration::days(365));
            assert!(d.license_expiry >= today + Duration::days(90));
            assert!(d.license_number.starts_with(&d.license_state));

            let t = synth.trailer(&mut rng, &mut encoder, ORG);
            assert_eq!(t.next_inspection_date - t.last_inspection_date, Duration::days(365));
            assert!(t.last_inspection_date <= today);
            assert!((40_000..=45_000).contains(&t.capacity_lbs));
            assert_eq!(t.length_ft, 53);
        }
    }

    #[test]
    fn loads_stay_inside_their_month() {
        let synth = synthesizer();
        let mut rng = StdRng::seed_from_u64(4);
        let mut encoder = IdentityEncoder::new();
        let february = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();

        for _ in 0..500 {
            let l = synth.load(&mut rng, &mut encoder, february, ORG);
            assert_ne!(l.origin_city, l.destination_city);
            assert_eq!(l.pickup_at.month(), 2);
            assert_eq!(l.pickup_at.year(), 2024);
            let transit = l.delivery_at - l.pickup_at;
            assert!(transit >= Duration::days(1) && transit <= Duration::days(5));
            assert!((100..=2500).contains(&l.distance_miles));
            assert!(l.rate.scale() == 2);
            assert!(l.rate >= dec!(235.00) && l.rate <= dec!(8375.00), "{}", l.rate);
            assert!(l.load_number.starts_with("LD2402"));
            assert!(matches!(l.status, LoadStatus::Open | LoadStatus::Covered));
        }
    }

    #[test]
    fn organization_hierarchy_is_consistent() {
        let synth = synthesizer();
        let mut rng = StdRng::seed_from_u64(5);
        let org = synth.organization(&mut rng, 3, 27, 2, 2).unwrap();

        assert_eq!(org.companies.len(), 3);
        assert_eq!(org.divisions.len(), 6);
        assert_eq!(org.departments.len(), 12);
        assert_eq!(org.terminals.len(), 27);

        let codes: HashSet<_> = org.terminals.iter().map(|t| t.code.clone()).collect();
        assert_eq!(codes.len(), 27);

        for terminal in &org.terminals {
            let department = terminal.department_code.as_deref().unwrap();
            assert!(department.starts_with(&terminal.company_code));
        }
        assert_eq!(org.terminals[0].company_code, "CO01");
        assert_eq!(org.terminals[26].company_code, "CO03");
    }

    #[test]
    fn month_arithmetic() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(month_start(start, 13), NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()), 29);
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2023, 12, 1).unwrap()), 31);
    }

    #[test]
    fn statuses_render_snake_case() {
        assert_eq!(TruckStatus::OutOfService.to_string(), "out_of_service");
        assert_eq!(DriverType::OwnerOperator.as_ref(), "owner_operator");
        assert_eq!("in_transit".parse::<LoadStatus>().unwrap(), LoadStatus::InTransit);
    }
}
