use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to bind to; the next free port is used when it is taken
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Directory holding one `<slug>_<id>.json` file per field
    #[arg(long, env = "AGRI_FIELDS_DIR", default_value = "Field_co-ordinates")]
    pub fields_dir: PathBuf,

    /// Shared file overwritten by every coordinate export
    #[arg(
        long,
        env = "AGRI_EXPORT_PATH",
        default_value = "field_coordinates/manipal.json"
    )]
    pub export_path: PathBuf,

    /// Root containing the `detect_results` and `crop_imgs` image directories
    #[arg(long, env = "AGRI_STATIC_ROOT", default_value = ".")]
    pub static_root: PathBuf,

    /// Built dashboard to serve for every other path (e.g. `client/dist`)
    #[arg(long, env = "AGRI_CLIENT_DIST")]
    pub client_dist: Option<PathBuf>,

    /// Origins allowed to call the API from a browser
    #[arg(
        long = "cors-origin",
        env = "AGRI_CORS_ORIGINS",
        value_delimiter = ',',
        default_values = [
            "http://localhost:5173",
            "http://localhost:3000",
            "http://127.0.0.1:5173",
        ]
    )]
    pub cors_origins: Vec<String>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
