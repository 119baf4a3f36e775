use std::{path::PathBuf, process::ExitCode};

use drive_republish::{
    drive::{Endpoints, DRIVE_FILE_SCOPE},
    publish::{
        report_outcome, republish, resolve_key_file, PublishConfig, PublishResult, DEFAULT_EXTENSION,
        DEFAULT_FOLDER_NAME, DEFAULT_MEDIA_TYPE, DEFAULT_SOURCE_DIR,
    },
};

use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "drive-republish",
    about = "delete and recreate a google drive folder, then upload local json files into it"
)]
struct Opt {
    /// Service account key file (GOOGLE_APPLICATION_CREDENTIALS or service-account.json when omitted)
    #[structopt(short, long, parse(from_os_str))]
    key_file: Option<PathBuf>,

    /// Name of the Drive folder to recreate
    #[structopt(short, long, default_value = DEFAULT_FOLDER_NAME)]
    folder_name: String,

    /// Local directory whose files are uploaded
    #[structopt(short, long, parse(from_os_str), default_value = DEFAULT_SOURCE_DIR)]
    source_dir: PathBuf,

    /// OAuth2 scope requested for the service account
    #[structopt(long, default_value = DRIVE_FILE_SCOPE)]
    scope: String,

    /// Media type sent with every uploaded file
    #[structopt(long, default_value = DEFAULT_MEDIA_TYPE)]
    mime_type: String,

    /// Only file names ending with this suffix are uploaded
    #[structopt(long, default_value = DEFAULT_EXTENSION)]
    extension: String,
}

impl Opt {
    fn into_config(self) -> PublishConfig {
        PublishConfig::default()
            .with_key_file(resolve_key_file(self.key_file).as_path())
            .with_folder_name(&self.folder_name)
            .with_source_dir(self.source_dir.as_path())
            .with_scope(&self.scope)
            .with_media_type(&self.mime_type)
            .with_extension(&self.extension)
    }
}

#[tokio::main]
async fn main() -> PublishResult<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = Opt::from_args().into_config();
    tracing::debug!(?config, "starting");

    let result = republish(config, Endpoints::default(), |status| println!("{}", status)).await;
    report_outcome(result, &mut std::io::stdout())
}
