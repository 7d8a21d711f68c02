mod health;
mod job_delete;
mod job_list;
mod job_status;
mod settings;
mod submit;

pub use health::health_handler;
pub use job_delete::delete_job_handler;
pub use job_list::list_jobs_handler;
pub use job_status::job_status_handler;
pub use settings::{get_settings_handler, update_settings_handler};
pub use submit::submit_handler;
