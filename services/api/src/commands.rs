use crate::infra::build_store;
use clap::Args;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use water_connect::accounts::{AccountRole, AccountService, AccountView, SignUpForm};
use water_connect::config::AppConfig;
use water_connect::error::AppError;
use water_connect::notifications::{IssueNotifier, LogMailer};
use water_connect::registry::{SourceRegistryService, OPEN_ISSUES_FILENAME};
use water_connect::store::MemoryStore;

#[derive(Args, Debug, Default)]
pub(crate) struct ExportIssuesArgs {
    /// Destination file; prints to stdout when omitted
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct CreateAccountArgs {
    #[arg(long)]
    pub(crate) username: String,
    #[arg(long)]
    pub(crate) email: Option<String>,
    #[arg(long)]
    pub(crate) first_name: Option<String>,
    #[arg(long)]
    pub(crate) last_name: Option<String>,
    /// Grant access to the staff dashboard and issue management
    #[arg(long)]
    pub(crate) staff: bool,
    /// Grant superuser rights (implies staff)
    #[arg(long)]
    pub(crate) superuser: bool,
}

pub(crate) fn run_export_issues(args: ExportIssuesArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = build_store(&config.storage)?;
    let csv = export_issues(store)?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &csv)?;
            println!("Wrote open issues to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&csv)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

pub(crate) fn run_create_account(args: CreateAccountArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = build_store(&config.storage)?;
    let account = create_account(store, args)?;

    println!(
        "Created account #{} ({}){}",
        account.id,
        account.username,
        if account.is_staff { " with staff access" } else { "" }
    );
    Ok(())
}

fn export_issues(store: Arc<MemoryStore>) -> Result<Vec<u8>, AppError> {
    let service = SourceRegistryService::new(store, IssueNotifier::new(Arc::new(LogMailer)));
    let csv = service.open_issues_csv()?;
    tracing::debug!(bytes = csv.len(), file = OPEN_ISSUES_FILENAME, "open issues exported");
    Ok(csv)
}

fn create_account(store: Arc<MemoryStore>, args: CreateAccountArgs) -> Result<AccountView, AppError> {
    let service = AccountService::new(store);
    let account = service.create(
        SignUpForm {
            username: Some(args.username),
            email: args.email,
            first_name: args.first_name,
            last_name: args.last_name,
        },
        AccountRole {
            is_staff: args.staff,
            is_superuser: args.superuser,
        },
    )?;
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use water_connect::store::{AccountRepository, IssueRepository, SourceRepository};

    fn args(username: &str) -> CreateAccountArgs {
        CreateAccountArgs {
            username: username.to_string(),
            email: Some(format!("{username}@water.example")),
            first_name: None,
            last_name: None,
            staff: false,
            superuser: true,
        }
    }

    #[test]
    fn superuser_accounts_are_persisted_as_staff() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("water.json");
        let store = Arc::new(MemoryStore::open(&path).expect("store"));

        let account = create_account(store, args("admin")).expect("created");
        assert_eq!(account.username, "admin");
        assert!(account.is_staff);

        let reopened = MemoryStore::open(&path).expect("reopen");
        let staff = reopened.staff_accounts().expect("staff");
        assert_eq!(staff.len(), 1);
        assert_eq!(staff[0].id, account.id);
        assert!(staff[0].is_superuser);
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let store = Arc::new(MemoryStore::new());
        create_account(Arc::clone(&store), args("admin")).expect("created");
        let err = create_account(store, args("ADMIN")).expect_err("duplicate");
        assert!(err.to_string().contains("service error"));
    }

    #[test]
    fn export_writes_header_for_empty_registry() {
        let store = Arc::new(MemoryStore::new());
        assert!(store.list_sources().expect("sources").is_empty());
        assert!(store.list_issues().expect("issues").is_empty());

        let csv = export_issues(store).expect("csv");
        let text = String::from_utf8(csv).expect("utf8");
        assert_eq!(text.trim_end(), "ID,Source,Priority,Description,Reported At");
    }
}
