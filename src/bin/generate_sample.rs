use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// brand, models, base price of a new car
const CATALOGUE: [(&str, [&str; 3], f64); 6] = [
    ("Toyota", ["Corolla", "Camry", "RAV4"], 28000.0),
    ("Honda", ["Civic", "Accord", "CR-V"], 27000.0),
    ("Ford", ["Focus", "Fusion", "Escape"], 25000.0),
    ("BMW", ["3 Series", "5 Series", "X5"], 52000.0),
    ("Hyundai", ["Elantra", "Sonata", "Tucson"], 23000.0),
    ("Kia", ["Rio", "Optima", "Sportage"], 21000.0),
];
const TRANSMISSIONS: [&str; 2] = ["Automatic", "Manual"];
const FUEL_TYPES: [&str; 4] = ["Petrol", "Diesel", "Hybrid", "Electric"];
const CONDITIONS: [&str; 3] = ["New", "Like New", "Used"];
const ENGINE_SIZES: [f64; 6] = [1.2, 1.6, 2.0, 2.5, 3.0, 3.5];

const LISTINGS: usize = 600;
const CURRENT_YEAR: i64 = 2024;

struct Listing {
    brand: &'static str,
    model: &'static str,
    year: i64,
    price: Option<f64>,
    transmission: &'static str,
    mileage: f64,
    fuel_type: &'static str,
    engine_size: f64,
    condition: &'static str,
}

fn generate(rng: &mut SimpleRng) -> Vec<Listing> {
    (0..LISTINGS)
        .map(|_| {
            let (brand, models, base_price) = *rng.pick(&CATALOGUE);
            let model = *rng.pick(&models);
            let age = (rng.next_u64() % 18) as i64;
            let condition = match age {
                0 => "New",
                1..=2 => *rng.pick(&CONDITIONS[..2]),
                _ => "Used",
            };
            let depreciation = 0.88f64.powi(age as i32);
            let price = (base_price * depreciation * rng.gauss(1.0, 0.08)).max(500.0).round();
            let mileage = if condition == "New" {
                rng.next_f64() * 50.0
            } else {
                (age as f64 * rng.gauss(12000.0, 3000.0)).max(100.0)
            };

            Listing {
                brand,
                model,
                year: CURRENT_YEAR - age,
                // Roughly one listing in fifty has no usable price.
                price: (rng.next_u64() % 50 != 0).then_some(price),
                transmission: *rng.pick(&TRANSMISSIONS),
                mileage: mileage.round(),
                fuel_type: *rng.pick(&FUEL_TYPES),
                engine_size: *rng.pick(&ENGINE_SIZES),
                condition,
            }
        })
        .collect()
}

fn write_csv(listings: &[Listing], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV output")?;
    writer.write_record([
        "brand",
        "model",
        "year",
        "price",
        "transmission",
        "mileage",
        "fuel_type",
        "engine_size",
        "condition",
    ])?;
    for l in listings {
        writer.write_record([
            l.brand.to_string(),
            l.model.to_string(),
            l.year.to_string(),
            l.price.map_or_else(|| "N/A".to_string(), |p| p.to_string()),
            l.transmission.to_string(),
            l.mileage.to_string(),
            l.fuel_type.to_string(),
            l.engine_size.to_string(),
            l.condition.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(listings: &[Listing], path: &str) -> Result<()> {
    let text = |f: fn(&Listing) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(listings.iter().map(f).collect::<Vec<_>>()))
    };
    let float = |f: fn(&Listing) -> Option<f64>| -> ArrayRef {
        Arc::new(Float64Array::from(listings.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("brand", DataType::Utf8, false),
        Field::new("model", DataType::Utf8, false),
        Field::new("year", DataType::Int64, false),
        Field::new("price", DataType::Float64, true),
        Field::new("transmission", DataType::Utf8, false),
        Field::new("mileage", DataType::Float64, true),
        Field::new("fuel_type", DataType::Utf8, false),
        Field::new("engine_size", DataType::Float64, true),
        Field::new("condition", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            text(|l| l.brand),
            text(|l| l.model),
            Arc::new(Int64Array::from(
                listings.iter().map(|l| l.year).collect::<Vec<_>>(),
            )),
            float(|l| l.price),
            text(|l| l.transmission),
            float(|l| Some(l.mileage)),
            text(|l| l.fuel_type),
            float(|l| Some(l.engine_size)),
            text(|l| l.condition),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating Parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = SimpleRng::new(42);
    let listings = generate(&mut rng);

    write_csv(&listings, "car_listings_sample.csv")?;
    write_parquet(&listings, "car_listings_sample.parquet")?;

    log::info!(
        "Wrote {} listings to car_listings_sample.csv and car_listings_sample.parquet",
        listings.len()
    );
    Ok(())
}
