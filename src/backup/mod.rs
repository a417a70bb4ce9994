pub mod app_config;
pub mod command;
pub mod compress;
pub mod file_ext;
pub mod finish;
pub mod orchestrator;
pub mod params;
pub mod redacted;
pub mod result_error;
pub mod retention;
pub mod run_context;
pub mod run_log;
pub mod runner;
pub mod tar;
pub mod validate;

macro_rules! function_path {
    () => {
        concat!(module_path!(), "::", function_name!(), " ", file!(), ":", line!())
    };
}

pub(crate) use function_path;
