// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::Local;
use std::env;
use std::fs::File;
use std::io;

use park_and_ride::{Config, Leaving, ParkingLot, TimeOfDay};

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from_env()?;
    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        None | Some("ui") => run_ui_mode(&config),
        Some("rates") => run_rates(&config),
        Some("set-rate") => run_set_rate(&config, &args[1..]),
        Some("in") => run_check_in(&config, &args[1..]),
        Some("parked") => run_parked(&config),
        Some("out") => run_check_out(&config, &args[1..]),
        Some("revenue") => run_revenue(&config),
        Some("reset-revenue") => run_reset_revenue(&config, &args[1..]),
        Some("export") => run_export(&config, &args[1..]),
        Some("help") | Some("--help") | Some("-h") => {
            print_usage();
            Ok(())
        }
        Some(other) => {
            print_usage();
            bail!("unknown command: {}", other)
        }
    }
}

fn print_usage() {
    println!("park-and-ride {}", park_and_ride::VERSION);
    println!();
    println!("USAGE:");
    println!("  park-and-ride                      interactive console");
    println!("  park-and-ride rates                list hourly rates");
    println!("  park-and-ride set-rate <type> <rate>");
    println!("  park-and-ride in <type> <plate>    check a vehicle in");
    println!("  park-and-ride parked               list parked vehicles");
    println!("  park-and-ride out <plate> [HH:MM]  charge and check out (default: now)");
    println!("  park-and-ride revenue              today's revenue");
    println!("  park-and-ride reset-revenue --yes  zero the daily revenue");
    println!("  park-and-ride export [file.csv]    parked vehicles as CSV (stdout if no file)");
}

fn open_lot(config: &Config) -> Result<ParkingLot> {
    ParkingLot::open(config)
        .with_context(|| format!("Failed to open {}", config.db_path.display()))
}

fn run_rates(config: &Config) -> Result<()> {
    let lot = open_lot(config)?;

    println!("💰 Parking Rates (per hour)");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for entry in lot.rates.get_all()? {
        println!("  {:<15} {:>14}", entry.name, config.money(entry.rate));
    }
    println!();
    println!("  More than 24 hours: 24 hours rate × number of days");

    Ok(())
}

fn run_set_rate(config: &Config, args: &[String]) -> Result<()> {
    let [vehicle_type, rate] = args else {
        bail!("usage: set-rate <type> <rate>");
    };

    let lot = open_lot(config)?;
    let entry = lot.rates.update_rate(vehicle_type, rate)?;
    println!("✓ {} now {} per hour", entry.name, config.money(entry.rate));

    Ok(())
}

fn run_check_in(config: &Config, args: &[String]) -> Result<()> {
    let (vehicle_type, plate) = match args {
        [vehicle_type, plate @ ..] if !plate.is_empty() => (vehicle_type, plate.join(" ")),
        _ => bail!("usage: in <type> <plate>"),
    };

    let lot = open_lot(config)?;
    let record = lot.ledger.check_in(vehicle_type, &plate)?;
    println!(
        "🚗 {} ({}) checked in at {}",
        record.plate_number, record.vehicle_type, record.time
    );

    Ok(())
}

fn run_parked(config: &Config) -> Result<()> {
    let lot = open_lot(config)?;
    let vehicles = lot.ledger.parked()?;

    println!("🅿️  Parked vehicles: {}", vehicles.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for v in &vehicles {
        println!("  {:<15} {:<18} {}", v.vehicle_type, v.plate_number, v.time);
    }

    Ok(())
}

fn run_check_out(config: &Config, args: &[String]) -> Result<()> {
    let (plate, leaving) = match args {
        [] => bail!("usage: out <plate> [HH:MM]"),
        [plate] => (plate.clone(), Leaving::At(Local::now())),
        [rest @ .., last] => match TimeOfDay::parse(last) {
            // the last word is a time only if it parses as one
            Ok(time) => (rest.join(" "), Leaving::TimeOfDay(time)),
            Err(_) => (args.join(" "), Leaving::At(Local::now())),
        },
    };

    let lot = open_lot(config)?;
    let record = lot.ledger.find_by_plate(&plate)?;
    let quote = lot.ledger.quote(&record, leaving)?;

    println!("🚙 {} ({})", record.plate_number, record.vehicle_type);
    println!("   Entry time: {}", record.time);
    println!(
        "   Duration:   {}h {:02}m at {} per hour",
        quote.minutes / 60,
        quote.minutes % 60,
        config.money(quote.rate)
    );

    let receipt = lot.ledger.check_out(&record, quote.fee)?;
    println!("✓ Total charge: {}", config.money(receipt.fee));
    println!("✓ Revenue today: {}", config.money(receipt.total_revenue));

    Ok(())
}

fn run_revenue(config: &Config) -> Result<()> {
    let lot = open_lot(config)?;
    let summary = lot.ledger.summary()?;

    println!(
        "Hi {}, you have earned {} at {} today.",
        summary.attendant_name(),
        config.money(summary.revenue),
        config.lot_name
    );
    println!("Vehicles still parked: {}", summary.parked);

    Ok(())
}

fn run_reset_revenue(config: &Config, args: &[String]) -> Result<()> {
    if !args.iter().any(|a| a == "--yes" || a == "-y") {
        eprintln!("❌ Resetting the daily revenue needs confirmation.");
        eprintln!("   Run: park-and-ride reset-revenue --yes");
        std::process::exit(1);
    }

    let lot = open_lot(config)?;
    let previous = lot.ledger.revenue()?;
    lot.ledger.reset_revenue()?;
    println!("✓ Total revenue has been reset (was {})", config.money(previous));

    Ok(())
}

fn run_export(config: &Config, args: &[String]) -> Result<()> {
    let lot = open_lot(config)?;

    match args.first() {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {}", path))?;
            let rows = lot.ledger.export_csv(file)?;
            println!("✓ Exported {} vehicles to {}", rows, path);
        }
        None => {
            lot.ledger.export_csv(io::stdout().lock())?;
        }
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    println!("🖥️  Loading Park and Ride console...\n");

    let lot = open_lot(config)?;

    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(lot, config.clone())?;
    ui::run_ui(&mut app)?;

    println!("\n✅ Console closed");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ Console mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the subcommands: park-and-ride help");
    std::process::exit(1);
}
