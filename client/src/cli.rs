//! Command line definition for the `registry` binary.

use clap::{Args, Parser, Subcommand};
use shared::{CreateStudentRequest, ExportKind, StudentFilterParams};
use std::path::PathBuf;
use std::time::Duration;

use crate::app::{ClientSettings, DEFAULT_CACHE_PATH};
use crate::refresh::RefreshConfig;
use crate::services::api::DEFAULT_BASE_URL;

#[derive(Parser, Debug)]
#[command(author, version, about = "Command line client for the tutoring student registry")]
pub struct Cli {
    /// Base URL of the registry server
    #[arg(long, env = "REGISTRY_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Local fallback slot used while the server is unreachable
    #[arg(long, env = "REGISTRY_CACHE_PATH", default_value = DEFAULT_CACHE_PATH)]
    pub cache_path: PathBuf,

    /// Request timeout in seconds
    #[arg(long, env = "REGISTRY_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Roster refresh interval in seconds for `watch`
    #[arg(long, env = "REGISTRY_REFRESH_SECS", default_value_t = 30)]
    pub refresh_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn settings(&self) -> ClientSettings {
        ClientSettings {
            api_url: self.api_url.clone(),
            cache_path: self.cache_path.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            refresh: RefreshConfig {
                interval: Duration::from_secs(self.refresh_secs.max(1)),
                initial_delay: None,
            },
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show one page of the student table
    List {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        per_page: Option<usize>,
    },
    /// Enter a new student as an administrator
    Add(AddArgs),
    /// Finance dashboard over verified registrations
    Finance {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Student counts by gender, class and period
    Overview,
    /// Online registrations waiting for receipt review
    Pending,
    /// Accept the payment receipt of an online registration
    Verify { id: String },
    /// Reject the payment receipt of an online registration
    Reject { id: String },
    /// Delete students by ID
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Delete every student
    DeleteAll {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Write a CSV report into a directory
    Export {
        #[arg(long, default_value = "finance")]
        kind: ExportKind,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Keep the roster refreshed and print a summary after each load
    Watch,
    /// Check that the server is reachable
    Health,
    /// Check administrator credentials
    Login {
        #[arg(long, default_value = "admin")]
        username: String,
        #[arg(long, env = "REGISTRY_ADMIN_PASSWORD")]
        password: String,
    },
}

/// Filter criteria shared by the listing and report commands
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Substring of name, email or mobile
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub gender: Option<String>,
    /// physics, chemistry or combined-maths
    #[arg(long)]
    pub class: Option<String>,
    /// Registration month, YYYY-MM
    #[arg(long)]
    pub month: Option<String>,
    #[arg(long)]
    pub fee: Option<String>,
    #[arg(long)]
    pub start_date: Option<String>,
    #[arg(long)]
    pub end_date: Option<String>,
    /// verified, pending or rejected
    #[arg(long)]
    pub status: Option<String>,
    /// manual or online
    #[arg(long)]
    pub registration_type: Option<String>,
}

impl FilterArgs {
    pub fn to_params(&self) -> StudentFilterParams {
        StudentFilterParams {
            search: self.search.clone(),
            gender: self.gender.clone(),
            class: self.class.clone(),
            month: self.month.clone(),
            fee: self.fee.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            status: self.status.clone(),
            registration_type: self.registration_type.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub mobile: String,
    #[arg(long)]
    pub gender: String,
    #[arg(long)]
    pub address: String,
    /// Comma separated, e.g. physics,chemistry
    #[arg(long, value_delimiter = ',', required = true)]
    pub classes: Vec<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub register_date: String,
    /// Defaults to the suggested fee for the chosen classes
    #[arg(long)]
    pub fee: Option<i64>,
}

impl AddArgs {
    pub fn to_request(&self) -> CreateStudentRequest {
        let fee = self
            .fee
            .unwrap_or_else(|| registry_backend::domain::models::Student::suggested_fee(self.classes.len()));

        CreateStudentRequest {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            mobile: self.mobile.clone(),
            gender: self.gender.clone(),
            address: self.address.clone(),
            classes: self.classes.clone(),
            register_date: Some(self.register_date.clone()),
            registration_fee: Some(fee),
            payment_receipt: None,
            payment_receipt_name: None,
        }
    }
}
