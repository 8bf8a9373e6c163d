use anyhow::{anyhow, bail, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;

use grow_tracker::aggregate::{expense_by_category, Summary};
use grow_tracker::cli::{
    AddArgs, Cli, Commands, ExpenseCommand, FeedCommand, IncomeCommand, StockCommand,
    StrainCommand, UpdateArgs,
};
use grow_tracker::config::Config;
use grow_tracker::db::{GrowStore, PlantRow, PlantUpdate};
use grow_tracker::export::write_export;
use grow_tracker::models::{
    Expense, FeedingEvent, IncomeRecord, NutrientDose, Plant, StockItem, Strain,
};
use grow_tracker::{logger, session};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn main() -> Result<()> {
    let config = Config::from_env();
    if let Err(e) = logger::init(config.log_level) {
        eprintln!("Error setting up logging: {}", e);
    }

    let cli = Cli::parse();

    let mut store = match session::load(&config.session_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error loading {}: {:#}", config.session_path.display(), e);
            return Err(e);
        }
    };

    let changed = run(cli.command, &mut store, &config)?;
    if changed {
        session::save(&config.session_path, &store)?;
    }

    Ok(())
}

/// Runs one command. Returns whether the store was modified.
fn run(command: Commands, store: &mut GrowStore, config: &Config) -> Result<bool> {
    let cur = &config.currency;
    match command {
        Commands::View {
            search_param,
            id,
            ids,
            today: on,
        } => {
            let on = on.unwrap_or_else(today);
            let rows: Vec<PlantRow> = match (search_param, id) {
                (Some(param), None) => store.search_plants(&param, on),
                (None, Some(id)) => store
                    .plant_rows(on)
                    .into_iter()
                    .filter(|row| row.plant.plant_id == id)
                    .collect(),
                (None, None) => store.plant_rows(on),
                (Some(_), Some(_)) => {
                    eprintln!("Error: --search-param and --id cannot be used together");
                    bail!("--search-param and --id cannot be used together");
                }
            };

            if rows.is_empty() {
                println!("No plants found");
            }
            for row in rows {
                print_plant(&row, ids);
            }
            Ok(false)
        }
        Commands::Add(args) => {
            let id = args.id.clone();
            store.plants.add(new_plant(args))?;
            println!("Plant {} added", id);
            Ok(true)
        }
        Commands::Update(args) => {
            let id = args.id.clone();
            let update = plant_update(args);
            if update.is_empty() {
                println!("No changes given");
                return Ok(false);
            }
            if let Err(e) = store.update_plant(&id, update) {
                eprintln!("Error updating plant: {}", e);
                return Err(e.into());
            }
            println!("Plant {} updated", id);
            Ok(true)
        }
        Commands::Remove { id } => {
            store.plants.delete_by_key(&id)?;
            println!("Plant {} removed", id);
            Ok(true)
        }
        Commands::Feed(cmd) => feed(cmd, store),
        Commands::Strain(cmd) => strain(cmd, store),
        Commands::Expense(cmd) => expense(cmd, store, cur),
        Commands::Income(cmd) => income(cmd, store, cur),
        Commands::Stock(cmd) => stock(cmd, store, cur),
        Commands::Dashboard => {
            let summary = Summary::of(store);
            let counts = summary.counts;
            println!(
                "Plants: {}  Strains: {}  Expenses: {}  Income: {}  Stock: {}  Feedings: {}",
                counts.plants, counts.strains, counts.expenses, counts.income, counts.stock, counts.feeding
            );
            println!("Yield: {:.1} g", summary.total_yield);
            println!("Expenses: {} {:.2}", cur, summary.total_expense);
            println!("Income: {} {:.2}", cur, summary.total_income);
            println!("Net profit: {} {:.2}", cur, summary.net_profit);
            println!("Cost per gram: {} {:.2}", cur, summary.cost_per_gram);
            println!("Avg selling price: {} {:.2}/g", cur, summary.avg_selling_price);
            let by_category = expense_by_category(store);
            if !by_category.is_empty() {
                println!("Spend by category:");
                for (category, sum) in by_category {
                    println!("  {:<16} {} {:.2}", category, cur, sum);
                }
            }
            Ok(false)
        }
        Commands::Export { today: on } => {
            let now = Local::now().naive_local();
            let now = match on {
                Some(date) => date.and_time(now.time()),
                None => now,
            };
            match write_export(store, now, &config.export_dir) {
                Ok(path) => println!("Exported to {}", path.display()),
                Err(e) => {
                    eprintln!("Error exporting: {}", e);
                    return Err(e.into());
                }
            }
            Ok(false)
        }
    }
}

fn print_plant(row: &PlantRow, ids_only: bool) {
    let p = row.plant;
    if ids_only {
        println!("{}, '{}'", p.plant_id, p.strain_name);
        return;
    }
    let date = |d: Option<NaiveDate>| d.map_or_else(|| "-".to_string(), |d| d.to_string());
    println!(
        "ID: '{}'\nStrain: '{}' ({})\nStage: {}\nStatus: {}\nGerminated: {}  Veg: {}  Flip: {}  Harvest: {}",
        p.plant_id,
        p.strain_name,
        p.variety,
        row.stage,
        p.status,
        date(p.germination),
        date(p.transplant_veg),
        date(p.flip_flower),
        date(p.harvest),
    );
    if let Some(days) = row.flowering_days {
        println!("Flowering days: {}", days);
    }
    if let Some(days) = row.total_days {
        println!("Total days: {}", days);
    }
    if p.trimmed_yield_g > 0.0 {
        println!("Trimmed yield: {:.1} g", p.trimmed_yield_g);
    }
    if !p.phenotype_notes.is_empty() {
        println!("Notes: {}", p.phenotype_notes);
    }
    println!();
}

fn new_plant(args: AddArgs) -> Plant {
    Plant {
        variety: args.variety,
        gender: args.gender,
        environment: args.environment,
        propagation: args.propagation,
        source: args.source,
        batch: args.batch,
        germination: Some(args.germination.unwrap_or_else(today)),
        transplant_veg: args.veg,
        flip_flower: args.flip,
        mother_id: args.mother,
        medium: args.medium,
        container_litres: args.container,
        phenotype_notes: args.notes,
        ..Plant::new(args.id, args.strain)
    }
}

fn plant_update(args: UpdateArgs) -> PlantUpdate {
    PlantUpdate {
        strain_name: args.strain,
        germination: args.germination,
        transplant_veg: args.veg,
        flip_flower: args.flip,
        harvest: args.harvest,
        wet_weight_g: args.wet,
        dry_weight_g: args.dry,
        trimmed_yield_g: args.trimmed,
        rating: args.rating,
        status: args.status,
        phenotype_notes: args.notes,
        health_issues: args.health,
        photos_link: args.photos,
    }
}

/// Turns a 1-based row number typed by the user into a position.
fn position(row: usize) -> Result<usize> {
    row.checked_sub(1)
        .ok_or_else(|| anyhow!("rows are numbered from 1"))
}

fn parse_dose(raw: &str) -> Result<NutrientDose> {
    let (name, amount) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("nutrient '{}' should look like NAME=AMOUNT", raw))?;
    let amount = amount
        .trim()
        .parse()
        .map_err(|e| anyhow!("bad amount for nutrient '{}': {}", name, e))?;
    Ok(NutrientDose {
        name: name.trim().to_string(),
        amount,
    })
}

fn feed(cmd: FeedCommand, store: &mut GrowStore) -> Result<bool> {
    match cmd {
        FeedCommand::Add {
            date,
            plants,
            stage,
            nutrients,
            notes,
        } => {
            let nutrients = nutrients
                .iter()
                .map(|raw| parse_dose(raw))
                .collect::<Result<Vec<_>>>()?;
            let event = FeedingEvent {
                date: date.unwrap_or_else(today),
                plant_ids: plants,
                stage,
                nutrients,
                notes,
            };
            let pos = store.log_feeding(event)?;
            println!("Feeding logged as row {}", pos + 1);
            Ok(true)
        }
        FeedCommand::Remove { row } => {
            store.feeding.delete_at(position(row)?)?;
            println!("Feeding row {} removed", row);
            Ok(true)
        }
        FeedCommand::List => {
            for (i, event) in store.feeding.scan().iter().enumerate() {
                let doses: Vec<String> = event
                    .nutrients
                    .iter()
                    .map(|d| format!("{} {}", d.name, d.amount))
                    .collect();
                println!(
                    "{}. {} [{}] {} - {}",
                    i + 1,
                    event.date,
                    event.plant_ids.join(", "),
                    event.stage,
                    doses.join(", ")
                );
            }
            Ok(false)
        }
    }
}

fn strain(cmd: StrainCommand, store: &mut GrowStore) -> Result<bool> {
    match cmd {
        StrainCommand::Add {
            name,
            breeder,
            variety,
            flower_time,
            thc,
            terpenes,
            avg_yield,
            times_grown,
            keeper,
            notes,
        } => {
            let strain = Strain {
                name,
                breeder,
                variety,
                flower_time,
                thc_percent: thc,
                terpenes,
                avg_yield_g: avg_yield,
                times_grown,
                keeper,
                notes,
            };
            let name = strain.name.clone();
            store.strains.add(strain)?;
            println!("Strain {} added", name);
            Ok(true)
        }
        StrainCommand::Remove { name } => {
            let removed = store.strains.delete_by_key(&name)?;
            println!("Removed {} strain(s) named {}", removed, name);
            Ok(true)
        }
        StrainCommand::List => {
            for s in store.strains.scan() {
                println!("{} ({}, {}) keeper: {}", s.name, s.breeder, s.variety, s.keeper);
            }
            Ok(false)
        }
    }
}

fn expense(cmd: ExpenseCommand, store: &mut GrowStore, cur: &str) -> Result<bool> {
    match cmd {
        ExpenseCommand::Add {
            date,
            category,
            item,
            cost,
            quantity,
            supplier,
            paid_to,
            notes,
            receipt,
        } => {
            let expense = Expense {
                quantity,
                supplier,
                paid_to,
                notes,
                receipt_link: receipt,
                ..Expense::new(date.unwrap_or_else(today), category, item, cost)
            };
            let pos = store.expenses.add(expense)?;
            println!("Expense logged as row {}", pos + 1);
            Ok(true)
        }
        ExpenseCommand::Remove { row } => {
            store.expenses.delete_at(position(row)?)?;
            println!("Expense row {} removed", row);
            Ok(true)
        }
        ExpenseCommand::List => {
            for (i, e) in store.expenses.scan().iter().enumerate() {
                println!(
                    "{}. {} {} {} x{} {} {:.2} ({} {:.2} each)",
                    i + 1,
                    e.date,
                    e.category,
                    e.item,
                    e.quantity,
                    cur,
                    e.cost,
                    cur,
                    e.unit_cost()
                );
            }
            Ok(false)
        }
    }
}

fn income(cmd: IncomeCommand, store: &mut GrowStore, cur: &str) -> Result<bool> {
    match cmd {
        IncomeCommand::Add {
            date,
            strain,
            grams,
            price,
            buyer,
            payment,
            notes,
        } => {
            let record = IncomeRecord {
                buyer,
                payment,
                notes,
                ..IncomeRecord::new(date.unwrap_or_else(today), strain, grams, price)
            };
            let pos = store.income.add(record)?;
            println!("Sale logged as row {}", pos + 1);
            Ok(true)
        }
        IncomeCommand::Remove { row } => {
            store.income.delete_at(position(row)?)?;
            println!("Sale row {} removed", row);
            Ok(true)
        }
        IncomeCommand::List => {
            for (i, r) in store.income.scan().iter().enumerate() {
                println!(
                    "{}. {} {} {:.1} g @ {} {:.2} = {} {:.2} ({})",
                    i + 1,
                    r.date,
                    r.strain,
                    r.grams_sold,
                    cur,
                    r.price_per_gram,
                    cur,
                    r.total(),
                    r.payment
                );
            }
            Ok(false)
        }
    }
}

fn stock(cmd: StockCommand, store: &mut GrowStore, cur: &str) -> Result<bool> {
    match cmd {
        StockCommand::Add {
            strain,
            breeder,
            units,
            pack_cost,
        } => {
            let pos = store.stock.add(StockItem {
                strain,
                breeder,
                units_left: units,
                pack_cost,
            })?;
            println!("Stock logged as row {}", pos + 1);
            Ok(true)
        }
        StockCommand::Remove { row } => {
            store.stock.delete_at(position(row)?)?;
            println!("Stock row {} removed", row);
            Ok(true)
        }
        StockCommand::List => {
            for (i, s) in store.stock.scan().iter().enumerate() {
                println!(
                    "{}. {} ({}) {} left, {} {:.2} each",
                    i + 1,
                    s.strain,
                    s.breeder,
                    s.units_left,
                    cur,
                    s.cost_per_unit()
                );
            }
            Ok(false)
        }
    }
}
