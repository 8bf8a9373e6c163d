use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::{flowering_days, total_grow_days};
use crate::error::{Result, TrackerError};
use crate::models::{
    Expense, FeedingEvent, IncomeRecord, Plant, PlantStatus, StockItem, Strain,
};
use crate::stage::{compute_stage, Stage};

/// A record kind the store can hold.
pub trait Record: Clone {
    /// Name used in errors and logs.
    const KIND: &'static str;

    fn validate(&self) -> Result<()>;

    /// Key that must be unique within the collection, if the kind has one.
    fn unique_key(&self) -> Option<&str> {
        None
    }
}

/// Records that can be looked up and removed by a string key.
pub trait Keyed: Record {
    fn key(&self) -> &str;
}

macro_rules! record {
    ($ty:ty, $kind:literal) => {
        impl Record for $ty {
            const KIND: &'static str = $kind;

            fn validate(&self) -> Result<()> {
                <$ty>::validate(self)
            }
        }
    };
}

record!(FeedingEvent, "feeding");
record!(Expense, "expense");
record!(IncomeRecord, "income");
record!(StockItem, "stock");
record!(Strain, "strain");

impl Record for Plant {
    const KIND: &'static str = "plant";

    fn validate(&self) -> Result<()> {
        Plant::validate(self)
    }

    fn unique_key(&self) -> Option<&str> {
        Some(&self.plant_id)
    }
}

impl Keyed for Plant {
    fn key(&self) -> &str {
        &self.plant_id
    }
}

impl Keyed for Strain {
    fn key(&self) -> &str {
        &self.name
    }
}

/// Ordered list of records of one kind, kept in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Collection { items: Vec::new() }
    }
}

impl<T: Record> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every record, in the order they were added.
    pub fn scan(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    fn check_unique(&self, key: &str, skip: Option<usize>) -> Result<()> {
        let clash = self
            .items
            .iter()
            .enumerate()
            .any(|(i, item)| Some(i) != skip && item.unique_key() == Some(key));
        if clash {
            return Err(TrackerError::DuplicateKey {
                kind: T::KIND,
                key: key.to_string(),
            });
        }
        Ok(())
    }

    fn out_of_range(&self, index: usize) -> TrackerError {
        TrackerError::OutOfRange {
            kind: T::KIND,
            index,
            len: self.items.len(),
        }
    }

    /// Appends a record, returning its position.
    pub fn add(&mut self, record: T) -> Result<usize> {
        let checked = record.validate().and_then(|_| match record.unique_key() {
            Some(key) => self.check_unique(key, None),
            None => Ok(()),
        });
        if let Err(e) = checked {
            warn!(kind = T::KIND, error = %e, "rejected new record");
            return Err(e);
        }
        self.items.push(record);
        info!(kind = T::KIND, position = self.items.len() - 1, "record added");
        Ok(self.items.len() - 1)
    }

    /// Swaps in a whole new list of records, as produced by a table edit.
    ///
    /// Either every record is accepted or nothing changes.
    pub fn bulk_replace(&mut self, records: Vec<T>) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for record in &records {
            record.validate()?;
            if let Some(key) = record.unique_key() {
                if !seen.insert(key) {
                    warn!(kind = T::KIND, key, "bulk edit has a duplicate key");
                    return Err(TrackerError::DuplicateKey {
                        kind: T::KIND,
                        key: key.to_string(),
                    });
                }
            }
        }
        self.items.clear();
        self.items.extend(records);
        info!(kind = T::KIND, count = self.items.len(), "collection replaced");
        Ok(())
    }

    /// Overwrites the record at `index`.
    pub fn update_at(&mut self, index: usize, record: T) -> Result<()> {
        if index >= self.items.len() {
            return Err(self.out_of_range(index));
        }
        record.validate()?;
        if let Some(key) = record.unique_key() {
            self.check_unique(key, Some(index))?;
        }
        self.items[index] = record;
        info!(kind = T::KIND, position = index, "record updated");
        Ok(())
    }

    /// Removes the record at `index`; later records move up by one.
    pub fn delete_at(&mut self, index: usize) -> Result<T> {
        if index >= self.items.len() {
            let e = self.out_of_range(index);
            warn!(kind = T::KIND, error = %e, "nothing deleted");
            return Err(e);
        }
        let removed = self.items.remove(index);
        info!(kind = T::KIND, position = index, "record deleted");
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Keyed> Collection<T> {
    pub fn find(&self, key: &str) -> Option<&T> {
        self.items.iter().find(|item| item.key() == key)
    }

    fn find_mut(&mut self, key: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.key() == key)
    }

    /// Removes every record carrying `key`, returning how many went.
    pub fn delete_by_key(&mut self, key: &str) -> Result<usize> {
        let before = self.items.len();
        self.items.retain(|item| item.key() != key);
        let removed = before - self.items.len();
        if removed == 0 {
            warn!(kind = T::KIND, key, "nothing deleted");
            return Err(TrackerError::NotFound {
                kind: T::KIND,
                key: key.to_string(),
            });
        }
        info!(kind = T::KIND, key, removed, "record deleted");
        Ok(removed)
    }
}

/// Field-by-field changes to a plant. `None` leaves the field alone.
#[derive(Debug, Clone, Default)]
pub struct PlantUpdate {
    pub strain_name: Option<String>,
    pub germination: Option<NaiveDate>,
    pub transplant_veg: Option<NaiveDate>,
    pub flip_flower: Option<NaiveDate>,
    pub harvest: Option<NaiveDate>,
    pub wet_weight_g: Option<f64>,
    pub dry_weight_g: Option<f64>,
    pub trimmed_yield_g: Option<f64>,
    pub rating: Option<u8>,
    pub status: Option<PlantStatus>,
    pub phenotype_notes: Option<String>,
    pub health_issues: Option<String>,
    pub photos_link: Option<String>,
}

impl PlantUpdate {
    pub fn is_empty(&self) -> bool {
        self.strain_name.is_none()
            && self.germination.is_none()
            && self.transplant_veg.is_none()
            && self.flip_flower.is_none()
            && self.harvest.is_none()
            && self.wet_weight_g.is_none()
            && self.dry_weight_g.is_none()
            && self.trimmed_yield_g.is_none()
            && self.rating.is_none()
            && self.status.is_none()
            && self.phenotype_notes.is_none()
            && self.health_issues.is_none()
            && self.photos_link.is_none()
    }

    fn apply(self, plant: &mut Plant) {
        if let Some(v) = self.strain_name {
            plant.strain_name = v;
        }
        if let Some(v) = self.germination {
            plant.germination = Some(v);
        }
        if let Some(v) = self.transplant_veg {
            plant.transplant_veg = Some(v);
        }
        if let Some(v) = self.flip_flower {
            plant.flip_flower = Some(v);
        }
        if let Some(v) = self.harvest {
            plant.harvest = Some(v);
        }
        if let Some(v) = self.wet_weight_g {
            plant.wet_weight_g = v;
        }
        if let Some(v) = self.dry_weight_g {
            plant.dry_weight_g = v;
        }
        if let Some(v) = self.trimmed_yield_g {
            plant.trimmed_yield_g = v;
        }
        if let Some(v) = self.rating {
            plant.rating = Some(v);
        }
        if let Some(v) = self.status {
            plant.status = v;
        }
        if let Some(v) = self.phenotype_notes {
            plant.phenotype_notes = v;
        }
        if let Some(v) = self.health_issues {
            plant.health_issues = v;
        }
        if let Some(v) = self.photos_link {
            plant.photos_link = v;
        }
    }
}

/// A plant as read back from the store, with the values derived from its dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantRow<'a> {
    pub plant: &'a Plant,
    pub stage: Stage,
    pub flowering_days: Option<i64>,
    pub total_days: Option<i64>,
}

/// Every record the tracker holds for one grower.
///
/// Created empty, passed explicitly to whatever needs it and dropped or
/// [`reset`](GrowStore::reset) when the session ends.
///
/// Only [`Snapshot`] can be deserialized; turning it into a store runs every
/// record through the same checks as [`Collection::add`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GrowStore {
    pub plants: Collection<Plant>,
    pub feeding: Collection<FeedingEvent>,
    pub strains: Collection<Strain>,
    pub expenses: Collection<Expense>,
    pub income: Collection<IncomeRecord>,
    pub stock: Collection<StockItem>,
}

/// Raw record lists read from outside the store, not yet checked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub plants: Vec<Plant>,
    pub feeding: Vec<FeedingEvent>,
    pub strains: Vec<Strain>,
    pub expenses: Vec<Expense>,
    pub income: Vec<IncomeRecord>,
    pub stock: Vec<StockItem>,
}

impl GrowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from `snapshot`, rejecting it whole if any record is invalid
    /// or a plant id repeats.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let mut store = GrowStore::new();
        store.plants.bulk_replace(snapshot.plants)?;
        store.feeding.bulk_replace(snapshot.feeding)?;
        store.strains.bulk_replace(snapshot.strains)?;
        store.expenses.bulk_replace(snapshot.expenses)?;
        store.income.bulk_replace(snapshot.income)?;
        store.stock.bulk_replace(snapshot.stock)?;
        Ok(store)
    }

    pub fn reset(&mut self) {
        self.plants.clear();
        self.feeding.clear();
        self.strains.clear();
        self.expenses.clear();
        self.income.clear();
        self.stock.clear();
        info!("store reset");
    }

    /// Plants in insertion order, each with its stage worked out for `today`.
    pub fn plant_rows(&self, today: NaiveDate) -> Vec<PlantRow<'_>> {
        debug!(%today, count = self.plants.len(), "recomputing plant stages");
        self.plants
            .scan()
            .iter()
            .map(|plant| PlantRow {
                plant,
                stage: compute_stage(plant, today),
                flowering_days: flowering_days(plant),
                total_days: total_grow_days(plant),
            })
            .collect()
    }

    /// Plants whose id, strain or batch contains `needle`, ignoring case.
    pub fn search_plants(&self, needle: &str, today: NaiveDate) -> Vec<PlantRow<'_>> {
        let needle = needle.to_lowercase();
        self.plant_rows(today)
            .into_iter()
            .filter(|row| {
                row.plant.plant_id.to_lowercase().contains(&needle)
                    || row.plant.strain_name.to_lowercase().contains(&needle)
                    || row.plant.batch.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn stage_of(&self, plant_id: &str, today: NaiveDate) -> Result<Stage> {
        self.plants
            .find(plant_id)
            .map(|plant| compute_stage(plant, today))
            .ok_or_else(|| TrackerError::NotFound {
                kind: Plant::KIND,
                key: plant_id.to_string(),
            })
    }

    /// Applies `update` to the plant with `plant_id`.
    pub fn update_plant(&mut self, plant_id: &str, update: PlantUpdate) -> Result<&Plant> {
        let Some(plant) = self.plants.find_mut(plant_id) else {
            warn!(plant_id, "update for unknown plant");
            return Err(TrackerError::NotFound {
                kind: Plant::KIND,
                key: plant_id.to_string(),
            });
        };
        let mut changed = plant.clone();
        update.apply(&mut changed);
        changed.validate()?;
        *plant = changed;
        info!(plant_id, "plant updated");
        Ok(&*plant)
    }

    /// Records a feeding, stamping it with the current stage of the first plant fed
    /// when no stage was given.
    pub fn log_feeding(&mut self, mut event: FeedingEvent) -> Result<usize> {
        if event.stage.trim().is_empty() {
            if let Some(plant) = event.plant_ids.first().and_then(|id| self.plants.find(id)) {
                event.stage = compute_stage(plant, event.date).to_string();
            }
        }
        self.feeding.add(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExpenseCategory;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(item: &str, cost: f64) -> Expense {
        Expense::new(day(2024, 1, 1), ExpenseCategory::Equipment, item, cost)
    }

    #[test]
    fn add_appends_in_order() {
        let mut store = GrowStore::new();
        store.plants.add(Plant::new("P1", "Blue Dream")).unwrap();
        let pos = store.plants.add(Plant::new("P2", "Gelato")).unwrap();
        assert_eq!(pos, 1);
        assert_eq!(store.plants.scan().last().unwrap().plant_id, "P2");
        assert_eq!(store.plants.scan(), store.plants.scan());
    }

    #[test]
    fn duplicate_plant_id_is_rejected() {
        let mut store = GrowStore::new();
        store.plants.add(Plant::new("P1", "Blue Dream")).unwrap();
        let err = store.plants.add(Plant::new("P1", "Gelato")).unwrap_err();
        assert_eq!(
            err,
            TrackerError::DuplicateKey {
                kind: "plant",
                key: "P1".into()
            }
        );
        assert_eq!(store.plants.len(), 1);
        assert_eq!(store.plants.scan()[0].strain_name, "Blue Dream");
    }

    #[test]
    fn invalid_record_leaves_store_unchanged() {
        let mut store = GrowStore::new();
        assert!(store.plants.add(Plant::new("", "Blue Dream")).is_err());
        assert!(store.expenses.add(expense("Tent", 0.0)).is_err());
        assert_eq!(store, GrowStore::new());
    }

    #[test]
    fn strains_may_share_a_name() {
        let mut strains = Collection::new();
        strains.add(Strain::new("Gelato")).unwrap();
        strains.add(Strain::new("Gelato")).unwrap();
        strains.add(Strain::new("OG Kush")).unwrap();
        assert_eq!(strains.delete_by_key("Gelato"), Ok(2));
        assert_eq!(strains.len(), 1);
        assert!(matches!(
            strains.delete_by_key("Gelato"),
            Err(TrackerError::NotFound { kind: "strain", .. })
        ));
    }

    #[test]
    fn delete_at_shifts_later_records() {
        let mut expenses = Collection::new();
        for item in ["Tent", "Light", "Fan"] {
            expenses.add(expense(item, 10.0)).unwrap();
        }
        let removed = expenses.delete_at(1).unwrap();
        assert_eq!(removed.item, "Light");
        let items: Vec<_> = expenses.scan().iter().map(|e| e.item.as_str()).collect();
        assert_eq!(items, ["Tent", "Fan"]);
    }

    #[test]
    fn delete_out_of_range_is_reported() {
        let mut expenses = Collection::new();
        expenses.add(expense("Tent", 10.0)).unwrap();
        let err = expenses.delete_at(5).unwrap_err();
        assert_eq!(
            err,
            TrackerError::OutOfRange {
                kind: "expense",
                index: 5,
                len: 1
            }
        );
        assert_eq!(expenses.len(), 1);
    }

    #[test]
    fn bulk_replace_is_all_or_nothing() {
        let mut plants = Collection::new();
        plants.add(Plant::new("P1", "Blue Dream")).unwrap();

        let bad = vec![Plant::new("P2", "Gelato"), Plant::new("P2", "OG Kush")];
        assert!(matches!(
            plants.bulk_replace(bad),
            Err(TrackerError::DuplicateKey { .. })
        ));
        assert_eq!(plants.scan()[0].plant_id, "P1");

        let bad = vec![Plant::new("P2", "Gelato"), Plant::new("P3", "")];
        assert!(plants.bulk_replace(bad).is_err());
        assert_eq!(plants.len(), 1);

        plants
            .bulk_replace(vec![Plant::new("P2", "Gelato"), Plant::new("P3", "OG Kush")])
            .unwrap();
        let ids: Vec<_> = plants.scan().iter().map(|p| p.plant_id.as_str()).collect();
        assert_eq!(ids, ["P2", "P3"]);
    }

    #[test]
    fn update_at_keeps_ids_unique() {
        let mut plants = Collection::new();
        plants.add(Plant::new("P1", "Blue Dream")).unwrap();
        plants.add(Plant::new("P2", "Gelato")).unwrap();
        assert!(plants.update_at(1, Plant::new("P1", "Gelato")).is_err());
        plants.update_at(1, Plant::new("P2", "Gelato #41")).unwrap();
        assert_eq!(plants.scan()[1].strain_name, "Gelato #41");
        assert!(matches!(
            plants.update_at(2, Plant::new("P3", "x")),
            Err(TrackerError::OutOfRange { .. })
        ));
    }

    #[test]
    fn stages_follow_every_write() {
        let mut store = GrowStore::new();
        let today = day(2024, 2, 15);
        let mut plant = Plant::new("P1", "Blue Dream");
        plant.germination = Some(day(2024, 1, 1));
        store.plants.add(plant).unwrap();
        assert_eq!(store.plant_rows(today)[0].stage.to_string(), "Seedling Week 7");

        let update = PlantUpdate {
            flip_flower: Some(day(2024, 2, 1)),
            ..PlantUpdate::default()
        };
        store.update_plant("P1", update).unwrap();
        assert_eq!(store.plant_rows(today)[0].stage.to_string(), "Flower Week 3");
        assert_eq!(store.stage_of("P1", today), Ok(Stage::Flower { week: 3 }));
    }

    #[test]
    fn update_unknown_plant_is_not_found() {
        let mut store = GrowStore::new();
        let err = store.update_plant("nope", PlantUpdate::default()).unwrap_err();
        assert!(matches!(err, TrackerError::NotFound { kind: "plant", .. }));
    }

    #[test]
    fn invalid_update_is_not_applied() {
        let mut store = GrowStore::new();
        store.plants.add(Plant::new("P1", "Blue Dream")).unwrap();
        let update = PlantUpdate {
            rating: Some(0),
            dry_weight_g: Some(50.0),
            ..PlantUpdate::default()
        };
        assert!(store.update_plant("P1", update).is_err());
        assert_eq!(store.plants.scan()[0].dry_weight_g, 0.0);
    }

    #[test]
    fn feeding_is_stamped_with_stage() {
        let mut store = GrowStore::new();
        let mut plant = Plant::new("P1", "Blue Dream");
        plant.germination = Some(day(2024, 1, 1));
        plant.transplant_veg = Some(day(2024, 1, 15));
        store.plants.add(plant).unwrap();

        let event = FeedingEvent {
            date: day(2024, 1, 22),
            plant_ids: vec!["P1".into(), "P9".into()],
            stage: String::new(),
            nutrients: vec![],
            notes: String::new(),
        };
        store.log_feeding(event).unwrap();
        assert_eq!(store.feeding.scan()[0].stage, "Veg Week 2");

        // Later edits to the plant leave the recorded stage alone.
        store
            .update_plant(
                "P1",
                PlantUpdate {
                    harvest: Some(day(2024, 1, 20)),
                    ..PlantUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(store.feeding.scan()[0].stage, "Veg Week 2");
    }

    #[test]
    fn search_matches_strain_and_batch() {
        let mut store = GrowStore::new();
        store.plants.add(Plant::new("P1", "Blue Dream")).unwrap();
        let mut gelato = Plant::new("P2", "Gelato");
        gelato.batch = "Winter-24".into();
        store.plants.add(gelato).unwrap();
        let today = day(2024, 1, 1);
        assert_eq!(store.search_plants("blue", today).len(), 1);
        assert_eq!(store.search_plants("winter", today)[0].plant.plant_id, "P2");
        assert!(store.search_plants("kush", today).is_empty());
    }

    #[test]
    fn snapshot_with_duplicate_plant_is_rejected() {
        let snapshot = Snapshot {
            plants: vec![Plant::new("P1", "Blue Dream"), Plant::new("P1", "Gelato")],
            ..Snapshot::default()
        };
        assert!(matches!(
            GrowStore::from_snapshot(snapshot),
            Err(TrackerError::DuplicateKey { kind: "plant", .. })
        ));
    }

    #[test]
    fn snapshot_with_negative_cost_is_rejected() {
        let snapshot = Snapshot {
            expenses: vec![expense("Tent", -5.0)],
            ..Snapshot::default()
        };
        assert!(matches!(
            GrowStore::from_snapshot(snapshot),
            Err(TrackerError::Validation { kind: "expense", .. })
        ));
    }

    #[test]
    fn valid_snapshot_keeps_order() {
        let snapshot = Snapshot {
            plants: vec![Plant::new("P2", "Gelato"), Plant::new("P1", "Blue Dream")],
            expenses: vec![expense("Tent", 10.0)],
            ..Snapshot::default()
        };
        let store = GrowStore::from_snapshot(snapshot).unwrap();
        let ids: Vec<_> = store.plants.scan().iter().map(|p| p.plant_id.as_str()).collect();
        assert_eq!(ids, ["P2", "P1"]);
        assert_eq!(store.expenses.len(), 1);
    }

    #[test]
    fn reset_empties_every_collection() {
        let mut store = GrowStore::new();
        store.plants.add(Plant::new("P1", "Blue Dream")).unwrap();
        store.expenses.add(expense("Tent", 10.0)).unwrap();
        store.reset();
        assert_eq!(store, GrowStore::new());
    }
}
