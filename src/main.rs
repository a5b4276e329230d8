use std::collections::BTreeSet;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

use clap::{crate_authors, crate_description, crate_version, App, AppSettings, Arg, ArgMatches};
use failure::Error;
use log::{error, info, warn};
use simplelog::{ColorChoice, CombinedLogger, SharedLogger, TermLogger, TerminalMode, WriteLogger};

use settings::Settings;

use crate::gisi::{
    outputs_with_empty_element, outputs_with_placeholder_resources, EmptyElementReport,
    GisiDocument, ResourceCatalog, SourceExtractor, TemplateRenderer,
};
use crate::store::{DocumentStore, HttpDocumentStore, RenderManifest, Watermark};
use crate::sync::{completed_folder_ids, write_assignment_sheet, AssignmentRow, SyncPass, Uploader};

mod gisi;
mod settings;
mod store;
mod sync;
#[cfg(test)]
mod test_utils;

fn main() {
    let matches = App::new("GISI Metadata Sync")
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::new("settings")
                .short('s')
                .long("settings")
                .value_name("SETTINGS")
                .help("Specify the settings file")
                .takes_value(true),
        )
        .subcommand(
            App::new("translate")
                .about("Translate source metadata XML into GISI documents")
                .arg(
                    Arg::new("sources")
                        .value_name("SOURCES")
                        .help("Source XML files or directories containing them")
                        .required(true)
                        .multiple_values(true),
                ),
        )
        .subcommand(
            App::new("upload")
                .about("Upload narrative elements of the last render pass to the store"),
        )
        .subcommand(
            App::new("sync")
                .about("Pull edited narratives back down into the output XML")
                .arg(
                    Arg::new("start-time")
                        .long("start-time")
                        .value_name("TIMESTAMP")
                        .help("Process edits after this ISO-8601 timestamp instead of the watermark")
                        .takes_value(true),
                )
                .arg(
                    Arg::new("category")
                        .long("category")
                        .value_name("CATEGORY")
                        .help("Only sync the layer folders of this category")
                        .takes_value(true),
                )
                .arg(
                    Arg::new("sign-off")
                        .long("sign-off")
                        .value_name("CSV")
                        .help("Only sync folders marked done in this sign-off sheet")
                        .takes_value(true)
                        .conflicts_with("category"),
                ),
        )
        .subcommand(
            App::new("audit").about("Report outputs with empty narratives or placeholder links"),
        )
        .subcommand(
            App::new("review-sheet")
                .about("Export the review assignment sheet from the store folders")
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_name("CSV")
                        .help("Where to write the sheet")
                        .takes_value(true),
                ),
        )
        .get_matches();

    let settings_path = matches.value_of("settings").map(Path::new);
    let settings = Settings::new(settings_path).expect("Unable to use config file.");

    initialize_logger(Path::new(&settings.general.log_file), &settings)
        .expect("Unable to initialize logger.");

    let result = match matches.subcommand() {
        Some(("translate", sub_matches)) => translate(&settings, sub_matches),
        Some(("upload", _)) => upload(&settings),
        Some(("sync", sub_matches)) => sync(&settings, sub_matches),
        Some(("audit", _)) => audit(&settings),
        Some(("review-sheet", sub_matches)) => review_sheet(&settings, sub_matches),
        _ => Ok(()),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Translate every source file into an output GISI document and record the
/// outputs in the manifest for the following upload and sync passes.
fn translate(settings: &Settings, matches: &ArgMatches) -> Result<(), Error> {
    let renderer = TemplateRenderer::from_path(Path::new(&settings.metadata.template_file))?;

    let resources = match &settings.metadata.resources_file {
        Some(path) => ResourceCatalog::from_path(Path::new(path))?,
        None => ResourceCatalog::empty(),
    };

    let source_paths = collect_source_paths(matches)?;

    let mut extractor = SourceExtractor::new();
    let mut output_files = Vec::new();

    for source_path in source_paths
        .iter()
        .skip(
            settings
                .debug
                .dataset_start
                .filter(|_| settings.general.debug)
                .unwrap_or(usize::MIN),
        )
        .take(
            settings
                .debug
                .dataset_limit
                .filter(|_| settings.general.debug)
                .unwrap_or(usize::MAX),
        )
    {
        let xml_bytes = match fs::read(source_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Unable to read `{}`: {}", source_path.display(), e);
                continue;
            }
        };

        let mut document = GisiDocument::new(source_path, &settings.metadata);
        document.resource_locations = resources.value_of(document.name());

        if let Err(e) = extractor.extract(&mut document, &xml_bytes) {
            warn!("Unable to extract `{}`: {}", source_path.display(), e);
            continue;
        }

        let output_path =
            Path::new(&settings.metadata.output_dir).join(document.output_file_name());

        match renderer.render_to_path(&document, &output_path) {
            Ok(()) => {
                info!("Rendered `{}` to `{}`", document.name(), output_path.display());
                output_files.push(output_path.display().to_string());
            }
            Err(e) => warn!("Unable to render `{}`: {}", document.name(), e),
        }
    }

    info!("Translated {} datasets.", output_files.len());

    RenderManifest::new(output_files).save(Path::new(&settings.sync.manifest_file))?;

    Ok(())
}

/// Upload the narrative elements of the last render pass to the store.
fn upload(settings: &Settings) -> Result<(), Error> {
    let manifest = RenderManifest::from_path(Path::new(&settings.sync.manifest_file))?;

    let store = HttpDocumentStore::new(&settings.store);
    let uploader = Uploader::new(&store, &settings.store);

    let uploaded = uploader.upload_narratives(&manifest.output_paths(), &settings.sync.elements)?;

    info!("Uploaded {} narrative documents.", uploaded.len());

    Ok(())
}

/// Pull edits made since the watermark back into the output XML, then move
/// the watermark forward.
fn sync(settings: &Settings, matches: &ArgMatches) -> Result<(), Error> {
    let watermark_path = Path::new(&settings.sync.watermark_file);

    let since = match matches.value_of("start-time") {
        Some(timestamp) => timestamp.to_string(),
        None => Watermark::from_path(watermark_path)?.last_update,
    };

    let store = HttpDocumentStore::new(&settings.store);
    let sync_pass = SyncPass::new(&store, &settings.store, &settings.metadata);

    let touched = if let Some(category) = matches.value_of("category") {
        sync_pass.run_for_category(&since, category)?
    } else if let Some(sign_off_path) = matches.value_of("sign-off") {
        let sign_off = File::open(sign_off_path)?;
        let mut touched = Vec::new();
        for folder_id in completed_folder_ids(sign_off)? {
            touched.extend(sync_pass.run(&since, &folder_id)?);
        }
        touched
    } else {
        sync_pass.run(&since, &settings.store.all_documents_folder)?
    };

    info!("Updated {} output documents.", touched.len());

    Watermark::now().save(watermark_path)?;

    Ok(())
}

/// Report rendered outputs that still need attention.
fn audit(settings: &Settings) -> Result<(), Error> {
    let manifest = RenderManifest::from_path(Path::new(&settings.sync.manifest_file))?;
    let output_paths = manifest.output_paths();

    let mut empties = BTreeSet::new();
    for element in &settings.sync.elements {
        empties.extend(outputs_with_empty_element(&output_paths, element)?);
    }
    let empties: Vec<PathBuf> = empties.into_iter().collect();

    let report_path = Path::new(&settings.metadata.output_dir)
        .join("temp")
        .join("empties.json");
    EmptyElementReport::new(&empties).save(&report_path)?;

    info!(
        "{} outputs have empty narrative elements; report at `{}`.",
        empties.len(),
        report_path.display()
    );

    for output_path in outputs_with_placeholder_resources(&output_paths)? {
        warn!(
            "`{}` still carries placeholder download links.",
            output_path.display()
        );
    }

    Ok(())
}

/// Export one assignment row per layer folder in the store.
fn review_sheet(settings: &Settings, matches: &ArgMatches) -> Result<(), Error> {
    let store = HttpDocumentStore::new(&settings.store);

    let mut rows = Vec::new();

    for category_id in store.subfolder_ids(&settings.store.categories_folder)? {
        let category = store.folder_info(&category_id)?;

        for layer_id in store.subfolder_ids(&category_id)? {
            let layer = store.folder_info(&layer_id)?;

            rows.push(AssignmentRow {
                full_name: format!("{}.{}", category.name, layer.name),
                web_view_link: layer.web_view_link,
                folder_id: layer_id,
            });
        }
    }

    let output_path = matches
        .value_of("output")
        .unwrap_or("data/outputs/temp/sheet.csv");

    if let Some(parent) = Path::new(output_path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    write_assignment_sheet(Path::new(output_path), &rows)?;

    info!("Wrote {} assignment rows to `{}`.", rows.len(), output_path);

    Ok(())
}

fn collect_source_paths(matches: &ArgMatches) -> Result<Vec<PathBuf>, Error> {
    let mut source_paths = Vec::new();

    for value in matches.values_of("sources").into_iter().flatten() {
        let path = PathBuf::from(value);

        if path.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(&path)?
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|entry_path| {
                    entry_path
                        .extension()
                        .map(|extension| extension == "xml")
                        .unwrap_or(false)
                })
                .collect();
            entries.sort();
            source_paths.extend(entries);
        } else {
            source_paths.push(path);
        }
    }

    Ok(source_paths)
}

/// Initialize the logger.
fn initialize_logger(file_path: &Path, settings: &Settings) -> Result<(), Error> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    let log_level = if settings.general.debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    loggers.push(TermLogger::new(
        log_level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ));

    if let Ok(file) = File::create(file_path) {
        loggers.push(WriteLogger::new(
            log_level,
            simplelog::Config::default(),
            file,
        ));
    }

    CombinedLogger::init(loggers)?;

    Ok(())
}
