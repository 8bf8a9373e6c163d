use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, TrackerError};
use crate::stage::parse_milestone;

/// Declares a closed set of choices with the label shown in forms and spreadsheets.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.label())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        let labels: Vec<&str> = Self::ALL.iter().map(|v| v.label()).collect();
                        format!("'{}' is not one of: {}", wanted, labels.join(", "))
                    })
            }
        }
    };
}

labelled_enum! {
    Variety {
        Sativa => "Sativa",
        Indica => "Indica",
        #[default]
        Hybrid => "Hybrid",
    }
}

labelled_enum! {
    Gender {
        #[default]
        Female => "Female",
        Male => "Male",
        Unknown => "Unknown",
    }
}

labelled_enum! {
    Environment {
        #[default]
        Indoor => "Indoor",
        Outdoor => "Outdoor",
    }
}

labelled_enum! {
    /// How the plant was started.
    Propagation {
        #[default]
        Seed => "Seed",
        Cutting => "Clone",
    }
}

labelled_enum! {
    GrowingMedium {
        #[default]
        FabricPot => "Fabric Pot",
        PlasticPot => "Plastic Pot",
        Coco => "Coco",
        Hydro => "Hydro",
    }
}

labelled_enum! {
    /// Status the grower sets by hand. Unlike the stage, it is stored as entered.
    PlantStatus {
        #[default]
        Germinating => "Germinating",
        Vegetating => "Vegetating",
        Flowering => "Flowering",
        Drying => "Drying",
        Curing => "Curing",
        Done => "Done",
        Died => "Died",
    }
}

labelled_enum! {
    Keeper {
        Yes => "Yes",
        No => "No",
        #[default]
        Maybe => "Maybe",
    }
}

labelled_enum! {
    ExpenseCategory {
        Seeds => "Seeds",
        Clones => "Clones",
        Nutrients => "Nutrients",
        Medium => "Growing Medium",
        Containers => "Containers",
        Lighting => "Lighting",
        Electricity => "Electricity",
        Water => "Water",
        Equipment => "Equipment",
        PestControl => "Pest Control",
        #[default]
        Other => "Other",
    }
}

labelled_enum! {
    PaymentMethod {
        #[default]
        Cash => "Cash",
        Eft => "EFT",
        Card => "Card",
        Crypto => "Crypto",
        Other => "Other",
    }
}

/// Dates that fail to parse are read back as absent.
fn lenient_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_milestone))
}

fn non_negative(kind: &'static str, field: &str, value: f64) -> Result<()> {
    if value.is_nan() || value < 0.0 {
        return Err(TrackerError::validation(
            kind,
            format!("{} must be zero or more, got {}", field, value),
        ));
    }
    Ok(())
}

fn required(kind: &'static str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TrackerError::validation(
            kind,
            format!("{} is required", field),
        ));
    }
    Ok(())
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Plant {
    pub plant_id: String,
    pub strain_name: String,
    pub variety: Variety,
    pub gender: Gender,
    pub environment: Environment,
    pub propagation: Propagation,
    pub source: String,
    pub batch: String,
    #[serde(deserialize_with = "lenient_date")]
    pub germination: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_date")]
    pub transplant_veg: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_date")]
    pub flip_flower: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_date")]
    pub harvest: Option<NaiveDate>,
    pub wet_weight_g: f64,
    pub dry_weight_g: f64,
    pub trimmed_yield_g: f64,
    /// Id of the mother plant. Never checked against the plant list.
    pub mother_id: Option<String>,
    pub medium: GrowingMedium,
    pub container_litres: f64,
    pub phenotype_notes: String,
    pub health_issues: String,
    pub rating: Option<u8>,
    pub photos_link: String,
    pub status: PlantStatus,
}

impl Plant {
    pub fn new(plant_id: impl Into<String>, strain_name: impl Into<String>) -> Self {
        Plant {
            plant_id: plant_id.into(),
            strain_name: strain_name.into(),
            ..Plant::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        const KIND: &str = "plant";
        required(KIND, "plant id", &self.plant_id)?;
        required(KIND, "strain name", &self.strain_name)?;
        non_negative(KIND, "wet weight", self.wet_weight_g)?;
        non_negative(KIND, "dry weight", self.dry_weight_g)?;
        non_negative(KIND, "trimmed yield", self.trimmed_yield_g)?;
        non_negative(KIND, "container size", self.container_litres)?;
        if let Some(rating) = self.rating {
            if !(1..=10).contains(&rating) {
                return Err(TrackerError::validation(
                    KIND,
                    format!("rating must be between 1 and 10, got {}", rating),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NutrientDose {
    pub name: String,
    pub amount: f64,
}

/// Most nutrients a single feeding can list.
pub const MAX_NUTRIENTS: usize = 5;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FeedingEvent {
    pub date: NaiveDate,
    /// Plant ids fed. Kept as plain strings, they may name plants that no longer exist.
    pub plant_ids: Vec<String>,
    /// Stage label at the time of feeding; not recomputed afterwards.
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub nutrients: Vec<NutrientDose>,
    #[serde(default)]
    pub notes: String,
}

impl FeedingEvent {
    pub fn validate(&self) -> Result<()> {
        const KIND: &str = "feeding";
        if self.plant_ids.is_empty() {
            return Err(TrackerError::validation(KIND, "at least one plant id is required"));
        }
        if self.plant_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(TrackerError::validation(KIND, "plant ids cannot be blank"));
        }
        if self.nutrients.len() > MAX_NUTRIENTS {
            return Err(TrackerError::validation(
                KIND,
                format!("at most {} nutrients per feeding", MAX_NUTRIENTS),
            ));
        }
        for dose in &self.nutrients {
            required(KIND, "nutrient name", &dose.name)?;
            non_negative(KIND, "nutrient amount", dose.amount)?;
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Strain {
    pub name: String,
    pub breeder: String,
    pub variety: Variety,
    /// Free text, e.g. "8-9 weeks".
    pub flower_time: String,
    pub thc_percent: Option<f64>,
    pub terpenes: String,
    pub avg_yield_g: Option<f64>,
    pub times_grown: u32,
    pub keeper: Keeper,
    pub notes: String,
}

impl Strain {
    pub fn new(name: impl Into<String>) -> Self {
        Strain {
            name: name.into(),
            ..Strain::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        const KIND: &str = "strain";
        required(KIND, "strain name", &self.name)?;
        if let Some(thc) = self.thc_percent {
            if thc.is_nan() || !(0.0..=100.0).contains(&thc) {
                return Err(TrackerError::validation(
                    KIND,
                    format!("THC % must be between 0 and 100, got {}", thc),
                ));
            }
        }
        if let Some(avg) = self.avg_yield_g {
            non_negative(KIND, "average yield", avg)?;
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Expense {
    pub date: NaiveDate,
    pub category: ExpenseCategory,
    pub item: String,
    #[serde(default)]
    pub supplier: String,
    pub cost: f64,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub paid_to: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub receipt_link: String,
}

fn one() -> u32 {
    1
}

impl Expense {
    pub fn new(date: NaiveDate, category: ExpenseCategory, item: impl Into<String>, cost: f64) -> Self {
        Expense {
            date,
            category,
            item: item.into(),
            supplier: String::new(),
            cost,
            quantity: 1,
            paid_to: String::new(),
            notes: String::new(),
            receipt_link: String::new(),
        }
    }

    /// Cost of a single unit; zero when the quantity is zero.
    pub fn unit_cost(&self) -> f64 {
        if self.quantity == 0 {
            0.0
        } else {
            self.cost / f64::from(self.quantity)
        }
    }

    pub fn validate(&self) -> Result<()> {
        const KIND: &str = "expense";
        required(KIND, "item", &self.item)?;
        if self.cost.is_nan() || self.cost <= 0.0 {
            return Err(TrackerError::validation(
                KIND,
                format!("cost must be greater than zero, got {}", self.cost),
            ));
        }
        if self.quantity < 1 {
            return Err(TrackerError::validation(KIND, "quantity must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IncomeRecord {
    pub date: NaiveDate,
    /// Free text, not checked against the strain library.
    pub strain: String,
    pub grams_sold: f64,
    pub price_per_gram: f64,
    #[serde(default)]
    pub buyer: String,
    #[serde(default)]
    pub payment: PaymentMethod,
    #[serde(default)]
    pub notes: String,
}

impl IncomeRecord {
    pub fn new(date: NaiveDate, strain: impl Into<String>, grams_sold: f64, price_per_gram: f64) -> Self {
        IncomeRecord {
            date,
            strain: strain.into(),
            grams_sold,
            price_per_gram,
            buyer: String::new(),
            payment: PaymentMethod::default(),
            notes: String::new(),
        }
    }

    pub fn total(&self) -> f64 {
        self.grams_sold * self.price_per_gram
    }

    pub fn validate(&self) -> Result<()> {
        const KIND: &str = "income";
        required(KIND, "strain", &self.strain)?;
        if self.grams_sold.is_nan() || self.grams_sold <= 0.0 {
            return Err(TrackerError::validation(KIND, "grams sold must be greater than zero"));
        }
        if self.price_per_gram.is_nan() || self.price_per_gram <= 0.0 {
            return Err(TrackerError::validation(KIND, "price per gram must be greater than zero"));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct StockItem {
    pub strain: String,
    pub breeder: String,
    pub units_left: u32,
    pub pack_cost: f64,
}

impl StockItem {
    /// Pack cost spread over the units left; zero when the pack is empty.
    pub fn cost_per_unit(&self) -> f64 {
        if self.units_left == 0 {
            0.0
        } else {
            self.pack_cost / f64::from(self.units_left)
        }
    }

    pub fn validate(&self) -> Result<()> {
        const KIND: &str = "stock";
        required(KIND, "strain", &self.strain)?;
        non_negative(KIND, "pack cost", self.pack_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!("fabric pot".parse::<GrowingMedium>(), Ok(GrowingMedium::FabricPot));
        assert_eq!("eft".parse::<PaymentMethod>(), Ok(PaymentMethod::Eft));
        assert!("Ruderalis".parse::<Variety>().is_err());
    }

    #[test]
    fn plant_requires_id_and_strain() {
        assert!(Plant::new("P1", "Blue Dream").validate().is_ok());
        assert!(matches!(
            Plant::new("  ", "Blue Dream").validate(),
            Err(TrackerError::Validation { kind: "plant", .. })
        ));
        assert!(Plant::new("P1", "").validate().is_err());
    }

    #[test]
    fn plant_rejects_negative_weight_and_bad_rating() {
        let mut plant = Plant::new("P1", "Blue Dream");
        plant.dry_weight_g = -1.0;
        assert!(plant.validate().is_err());

        let mut plant = Plant::new("P1", "Blue Dream");
        plant.rating = Some(11);
        assert!(plant.validate().is_err());
        plant.rating = Some(10);
        assert!(plant.validate().is_ok());
    }

    #[test]
    fn malformed_dates_read_back_as_absent() {
        let json = r#"{"plant_id":"P1","strain_name":"Blue Dream","germination":"2024-01-01","flip_flower":"not a date","harvest":""}"#;
        let plant: Plant = serde_json::from_str(json).unwrap();
        assert_eq!(plant.germination, Some(day(2024, 1, 1)));
        assert_eq!(plant.flip_flower, None);
        assert_eq!(plant.harvest, None);
        assert_eq!(plant.status, PlantStatus::Germinating);
    }

    #[test]
    fn unit_cost_splits_cost_over_quantity() {
        let mut expense = Expense::new(day(2024, 1, 5), ExpenseCategory::Nutrients, "Bloom A+B", 100.0);
        expense.quantity = 2;
        assert_eq!(expense.unit_cost(), 50.0);
        expense.quantity = 0;
        assert_eq!(expense.unit_cost(), 0.0);
        assert!(expense.validate().is_err());
    }

    #[test]
    fn expense_cost_must_be_positive() {
        let expense = Expense::new(day(2024, 1, 5), ExpenseCategory::Seeds, "Pack", 0.0);
        assert!(expense.validate().is_err());
    }

    #[test]
    fn income_total_and_validation() {
        let income = IncomeRecord::new(day(2024, 3, 1), "Blue Dream", 10.0, 20.0);
        assert_eq!(income.total(), 200.0);
        assert!(income.validate().is_ok());
        assert!(IncomeRecord::new(day(2024, 3, 1), "Blue Dream", 0.0, 20.0).validate().is_err());
        assert!(IncomeRecord::new(day(2024, 3, 1), "", 1.0, 20.0).validate().is_err());
    }

    #[test]
    fn stock_cost_per_unit_guards_empty_pack() {
        let mut stock = StockItem {
            strain: "Gelato".into(),
            pack_cost: 300.0,
            units_left: 3,
            ..StockItem::default()
        };
        assert_eq!(stock.cost_per_unit(), 100.0);
        stock.units_left = 0;
        assert_eq!(stock.cost_per_unit(), 0.0);
    }

    #[test]
    fn feeding_needs_a_plant_and_at_most_five_nutrients() {
        let mut feed = FeedingEvent {
            date: day(2024, 2, 1),
            plant_ids: vec![],
            stage: String::new(),
            nutrients: vec![],
            notes: String::new(),
        };
        assert!(feed.validate().is_err());
        feed.plant_ids.push("P1".into());
        assert!(feed.validate().is_ok());
        feed.nutrients = (0..6)
            .map(|i| NutrientDose { name: format!("N{}", i), amount: 1.0 })
            .collect();
        assert!(feed.validate().is_err());
        feed.nutrients.truncate(1);
        feed.nutrients[0].amount = -0.5;
        assert!(feed.validate().is_err());
    }

    #[test]
    fn feeding_rejects_blank_plant_id_among_others() {
        let feed = FeedingEvent {
            date: day(2024, 2, 1),
            plant_ids: vec!["P1".into(), " ".into()],
            stage: String::new(),
            nutrients: vec![],
            notes: String::new(),
        };
        assert!(matches!(
            feed.validate(),
            Err(TrackerError::Validation { kind: "feeding", .. })
        ));
    }

    #[test]
    fn strain_thc_range() {
        let mut strain = Strain::new("Gelato");
        strain.thc_percent = Some(101.0);
        assert!(strain.validate().is_err());
        strain.thc_percent = Some(24.5);
        assert!(strain.validate().is_ok());
    }
}
