use log::{error, info, warn};
use models::student::Student;
use parsers::{
    config::Settings,
    error::Result,
    pipeline::{Documents, Report, run},
};
use std::process::ExitCode;

/// Loads the settings and saved documents and builds the student
fn plan() -> Result<Student> {
    let settings = Settings::from_env()?;
    info!(
        "Reading documents from {} for {} terms",
        settings.documents_dir.display(),
        settings.terms.len()
    );

    let mut documents = Documents::load(&settings.documents_dir, &settings.terms)?;
    if let Err(e) = documents.cache_catalogue(&settings.documents_dir, &settings.terms) {
        warn!("Not caching the catalogue: {e}");
    }

    run(&documents, &settings.terms, settings.student_id.as_deref())
}

fn main() -> ExitCode {
    env_logger::init();

    let student = match plan() {
        Ok(student) => student,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&Report::new(&student)) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to encode report: {e}");
            ExitCode::FAILURE
        }
    }
}
