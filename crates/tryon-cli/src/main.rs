//! tryon - command-line front end for the try-on studio.
//!
//! ```bash
//! tryon catalog
//! tryon try-on --photo me.jpg --height "5'9\"" --garment 1 --garment 3 \
//!     --edit "make the top black" --save-look --out look.png
//! tryon looks
//! tryon delete-look 1718000000000
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tryon_core::app::{ArtifactStore, StudioBuilder, Workflow};
use tryon_core::config::StudioConfig;
use tryon_core::domain::{
    Catalog, GarmentId, Height, LookId, MeasurementId, OutfitSelection, SavedLook,
    SavedMeasurement,
};
use tryon_core::impls::{FileKeyValueStore, GeminiGateway, ScriptedGateway};
use tryon_core::ports::GenerationGateway;

#[derive(Parser, Debug)]
#[clap(name = "tryon", about = "Virtual try-on studio")]
struct Args {
    /// Config file (defaults to $TRYON_CONFIG, then the platform config dir)
    #[clap(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Garment catalog as a JSON array (defaults to the built-in catalog)
    #[clap(long, global = true, value_name = "FILE")]
    catalog: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List catalog garments
    Catalog,
    /// List saved looks
    Looks,
    /// List saved measurements
    Measurements,
    /// Delete a saved look
    DeleteLook { id: i64 },
    /// Delete a saved measurement
    DeleteMeasurement { id: i64 },
    /// Run the whole workflow once
    TryOn(TryOnArgs),
}

#[derive(clap::Args, Debug)]
struct TryOnArgs {
    #[clap(long, value_name = "FILE")]
    photo: PathBuf,

    /// Height as feet'inches, e.g. 5'9"
    #[clap(long)]
    height: String,

    /// Catalog garment id; repeat for several garments
    #[clap(long = "garment", value_name = "ID", required = true)]
    garments: Vec<i64>,

    /// Compose directly without the fit analysis
    #[clap(long)]
    skip_measure: bool,

    #[clap(long, conflicts_with = "skip_measure")]
    save_measurement: bool,

    /// Edit instruction; repeat to apply several in order
    #[clap(long = "edit", value_name = "INSTRUCTION")]
    edits: Vec<String>,

    /// Drop the last edit before finalizing
    #[clap(long)]
    undo: bool,

    #[clap(long)]
    save_look: bool,

    /// Where to write the final image (defaults to the configured file name)
    #[clap(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Use the canned offline gateway instead of the hosted service
    #[clap(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = StudioConfig::load(args.config.as_deref())?;
    let catalog = match &args.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin(),
    };
    let store = ArtifactStore::new(Arc::new(FileKeyValueStore::new(&config.data_dir)));

    match args.command {
        Command::Catalog => print_catalog(&catalog),
        Command::Looks => {
            for look in store.load::<SavedLook>().await {
                println!("{}  {}", look.id.value(), describe_outfit(&look.selected_outfit));
            }
        }
        Command::Measurements => {
            for sheet in store.load::<SavedMeasurement>().await {
                let people = &sheet.fit_analysis.person_measurements.measurements;
                let summary = people
                    .iter()
                    .map(|m| format!("{} {}", m.name, m.display_value()))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!(
                    "{}  {}  [{}]",
                    sheet.id.value(),
                    describe_outfit(&sheet.selected_outfit),
                    summary
                );
            }
        }
        Command::DeleteLook { id } => {
            let before = store.load::<SavedLook>().await.len();
            let after = store.delete::<SavedLook>(LookId::new(id)).await?.len();
            report_delete("look", id, before != after);
        }
        Command::DeleteMeasurement { id } => {
            let before = store.load::<SavedMeasurement>().await.len();
            let after = store
                .delete::<SavedMeasurement>(MeasurementId::new(id))
                .await?
                .len();
            report_delete("measurement", id, before != after);
        }
        Command::TryOn(try_on) => run_try_on(&config, catalog, try_on).await?,
    }
    Ok(())
}

fn print_catalog(catalog: &Catalog) {
    for item in catalog.items() {
        println!("{:>4}  {:<10} {}", item.id.value(), item.category.as_str(), item.name);
    }
}

fn describe_outfit(outfit: &OutfitSelection) -> String {
    outfit
        .items()
        .iter()
        .map(|item| item.name.as_str())
        .collect::<Vec<_>>()
        .join(" + ")
}

fn report_delete(what: &str, id: i64, removed: bool) {
    if removed {
        println!("deleted {what} {id}");
    } else {
        println!("no {what} with id {id}");
    }
}

fn photo_mime(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => Ok("image/jpeg"),
        Some("png") => Ok("image/png"),
        Some("webp") => Ok("image/webp"),
        _ => bail!("unsupported photo type: {}", path.display()),
    }
}

async fn run_try_on(config: &StudioConfig, catalog: Catalog, args: TryOnArgs) -> Result<()> {
    let gateway: Arc<dyn GenerationGateway> = if args.offline {
        Arc::new(ScriptedGateway::new())
    } else {
        Arc::new(GeminiGateway::from_env(config.gateway.clone())?)
    };
    let mut workflow = StudioBuilder::from_config(gateway, config)
        .catalog(catalog)
        .build()
        .await?;

    let bytes = tokio::fs::read(&args.photo)
        .await
        .with_context(|| format!("failed to read {}", args.photo.display()))?;
    workflow.upload_photo(&bytes, photo_mime(&args.photo)?)?;
    workflow.submit_height(args.height.parse::<Height>()?)?;
    for id in &args.garments {
        workflow.toggle_garment(GarmentId::new(*id))?;
    }

    if !args.skip_measure {
        workflow.proceed_to_measure().await?;
        print_analysis(&workflow);
        if args.save_measurement {
            let id = workflow.save_measurement().await?;
            println!("saved measurement {}", id.value());
        }
    }

    workflow.proceed_to_generate().await?;
    for instruction in &args.edits {
        workflow.apply_edit(instruction).await?;
        info!(instruction = %instruction, "edit applied");
    }
    if args.undo && !workflow.undo()? {
        println!("nothing to undo");
    }
    workflow.finalize()?;

    if args.save_look {
        let id = workflow.save_look().await?;
        println!("saved look {}", id.value());
    }

    let export = workflow.download()?;
    let out = args.out.unwrap_or_else(|| PathBuf::from(&export.file_name));
    tokio::fs::write(&out, &export.bytes)
        .await
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!("wrote {}", out.display());
    Ok(())
}

fn print_analysis(workflow: &Workflow) {
    let Some(analysis) = workflow.analysis() else {
        return;
    };
    println!("Body measurements:");
    for m in &analysis.person_measurements.measurements {
        println!("  {:<16} {}", m.name, m.display_value());
    }
    if !analysis.person_measurements.notes.is_empty() {
        println!("  {}", analysis.person_measurements.notes);
    }
    for fit in &analysis.clothing_fit {
        println!("{} ({}): {}", fit.item_name, fit.item_type, fit.fit_description);
        for m in &fit.garment_measurements {
            println!("  {:<16} {}", m.name, m.display_value());
        }
    }
}
