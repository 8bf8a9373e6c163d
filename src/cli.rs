use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::models::{
    Environment, ExpenseCategory, Gender, GrowingMedium, Keeper, PaymentMethod, PlantStatus,
    Propagation, Variety,
};

#[derive(Parser)]
#[command(name = "grow-tracker")]
#[command(about = "A CLI to keep track of plants, feedings, strains, money and seed stock")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// View plants with their current stage
    View {
        /// Search by plant id, strain or batch
        #[arg(long = "search-param")]
        search_param: Option<String>,
        /// Id of a single plant
        #[arg(long = "id")]
        id: Option<String>,
        /// Only list ids and strains
        #[arg(long = "ids")]
        ids: bool,
        /// Evaluate stages as of this date instead of today
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Add a new plant
    Add(AddArgs),
    /// Update an existing plant
    Update(UpdateArgs),
    /// Remove a plant
    Remove {
        /// Id of the plant to remove
        #[arg(long)]
        id: String,
    },
    /// Log or remove feedings
    #[command(subcommand)]
    Feed(FeedCommand),
    /// Manage the strain library
    #[command(subcommand)]
    Strain(StrainCommand),
    /// Record or remove expenses
    #[command(subcommand)]
    Expense(ExpenseCommand),
    /// Record or remove sales
    #[command(subcommand)]
    Income(IncomeCommand),
    /// Manage seed and clone stock
    #[command(subcommand)]
    Stock(StockCommand),
    /// Show totals, profit and spend per category
    Dashboard,
    /// Write everything to an Excel workbook
    Export {
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Plant id, must be unique
    #[arg(long = "id")]
    pub id: String,
    #[arg(short = 's', long = "strain")]
    pub strain: String,
    #[arg(long, default_value_t = Variety::default())]
    pub variety: Variety,
    #[arg(long, default_value_t = Gender::default())]
    pub gender: Gender,
    #[arg(long, default_value_t = Environment::default())]
    pub environment: Environment,
    /// Seed or Clone
    #[arg(long = "type", default_value_t = Propagation::default())]
    pub propagation: Propagation,
    #[arg(long, default_value_t = GrowingMedium::default())]
    pub medium: GrowingMedium,
    /// Container size in litres
    #[arg(long, default_value_t = 0.0)]
    pub container: f64,
    #[arg(long, default_value = "")]
    pub source: String,
    #[arg(long, default_value = "")]
    pub batch: String,
    #[arg(long)]
    pub mother: Option<String>,
    /// Germination date (defaults to today)
    #[arg(long)]
    pub germination: Option<NaiveDate>,
    #[arg(long)]
    pub veg: Option<NaiveDate>,
    #[arg(long)]
    pub flip: Option<NaiveDate>,
    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Id of the plant to update
    #[arg(long)]
    pub id: String,
    #[arg(long)]
    pub strain: Option<String>,
    #[arg(long)]
    pub germination: Option<NaiveDate>,
    #[arg(long)]
    pub veg: Option<NaiveDate>,
    #[arg(long)]
    pub flip: Option<NaiveDate>,
    #[arg(long)]
    pub harvest: Option<NaiveDate>,
    /// Wet weight in grams
    #[arg(long)]
    pub wet: Option<f64>,
    /// Dry weight in grams
    #[arg(long)]
    pub dry: Option<f64>,
    /// Trimmed yield in grams
    #[arg(long)]
    pub trimmed: Option<f64>,
    /// Rating from 1 to 10
    #[arg(long)]
    pub rating: Option<u8>,
    #[arg(long)]
    pub status: Option<PlantStatus>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub health: Option<String>,
    #[arg(long)]
    pub photos: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum FeedCommand {
    /// Log a feeding for one or more plants
    Add {
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Plant ids, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        plants: Vec<String>,
        /// Stage at feeding time (defaults to the first plant's stage)
        #[arg(long, default_value = "")]
        stage: String,
        /// Nutrient as NAME=AMOUNT, up to five times
        #[arg(long = "nutrient")]
        nutrients: Vec<String>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Remove a feeding by its position in the list (from 1)
    Remove {
        #[arg(long)]
        row: usize,
    },
    /// List every feeding
    List,
}

#[derive(Subcommand, Debug)]
pub enum StrainCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        breeder: String,
        #[arg(long, default_value_t = Variety::default())]
        variety: Variety,
        /// e.g. "8-9 weeks"
        #[arg(long, default_value = "")]
        flower_time: String,
        #[arg(long)]
        thc: Option<f64>,
        #[arg(long, default_value = "")]
        terpenes: String,
        #[arg(long)]
        avg_yield: Option<f64>,
        #[arg(long, default_value_t = 0)]
        times_grown: u32,
        #[arg(long, default_value_t = Keeper::default())]
        keeper: Keeper,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Remove every strain with this name
    Remove {
        #[arg(long)]
        name: String,
    },
    List,
}

#[derive(Subcommand, Debug)]
pub enum ExpenseCommand {
    Add {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        category: ExpenseCategory,
        #[arg(long)]
        item: String,
        #[arg(long)]
        cost: f64,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
        #[arg(long, default_value = "")]
        supplier: String,
        #[arg(long, default_value = "")]
        paid_to: String,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long, default_value = "")]
        receipt: String,
    },
    /// Remove an expense by its position in the list (from 1)
    Remove {
        #[arg(long)]
        row: usize,
    },
    List,
}

#[derive(Subcommand, Debug)]
pub enum IncomeCommand {
    Add {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        strain: String,
        #[arg(long)]
        grams: f64,
        #[arg(long)]
        price: f64,
        #[arg(long, default_value = "")]
        buyer: String,
        #[arg(long, default_value_t = PaymentMethod::default())]
        payment: PaymentMethod,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Remove a sale by its position in the list (from 1)
    Remove {
        #[arg(long)]
        row: usize,
    },
    List,
}

#[derive(Subcommand, Debug)]
pub enum StockCommand {
    Add {
        #[arg(long)]
        strain: String,
        #[arg(long, default_value = "")]
        breeder: String,
        #[arg(long, default_value_t = 0)]
        units: u32,
        #[arg(long, default_value_t = 0.0)]
        pack_cost: f64,
    },
    /// Remove a stock line by its position in the list (from 1)
    Remove {
        #[arg(long)]
        row: usize,
    },
    List,
}
