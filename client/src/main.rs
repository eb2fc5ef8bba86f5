use clap::Parser;
use shared::{LoginRequest, PageMarker};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use registry_backend::domain::{RegistryResult, StudentFilter, VerificationAction};
use registry_client::app::{describe_error, RegistryClient};
use registry_client::cli::{Cli, Command};

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output stays clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("Command failed: {}", e);
        eprintln!("Error: {}", describe_error(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> RegistryResult<()> {
    let settings = cli.settings();
    let client = RegistryClient::connect(&settings)?;

    match cli.command {
        Command::Health => {
            let health = client.api.test_connection().await?;
            println!("{}: {} (database {})", health.service, health.status, health.database);
        }
        Command::Login { username, password } => {
            let user = client.api.login(&LoginRequest { username, password }).await?;
            println!("Logged in as {} ({})", user.username, user.role);
        }
        Command::List { filters, page, per_page } => {
            let filter = StudentFilter::from_params(&filters.to_params())?;
            client.load().await?;
            print_table(&client, &filter, page, per_page).await;
        }
        Command::Add(args) => {
            let student = client.student_service.create_student(args.to_request()).await?;
            println!("Registered {} as {}", student.full_name(), student.id);
        }
        Command::Finance { filters } => {
            let filter = StudentFilter::from_params(&filters.to_params())?;
            client.load().await?;
            print_finance(&client, &filter).await;
        }
        Command::Overview => {
            client.load().await?;
            let overview = client.overview().await;
            println!("Students:  {} ({} male, {} female)", overview.total_students, overview.male_count, overview.female_count);
            for class in &overview.class_counts {
                println!("  {:<10} {}", class.label, class.count);
            }
            println!("This week: {}  This month: {}", overview.this_week, overview.this_month);
            println!("Pending verification: {}", overview.pending_verification);
        }
        Command::Pending => {
            client.load().await?;
            let pending = client.pending().await;
            if pending.is_empty() {
                println!("No registrations waiting for verification");
            }
            for student in pending {
                let receipt = student
                    .payment_receipt
                    .as_ref()
                    .and_then(|r| r.file_name.clone())
                    .unwrap_or_else(|| "no receipt".to_string());
                println!("{}  {:<24} {:<28} {}", student.id, student.full_name(), student.email, receipt);
            }
        }
        Command::Verify { id } => {
            let student = client.decide(&id, VerificationAction::Verify).await?;
            println!("{} is now {}", student.id, student.status);
        }
        Command::Reject { id } => {
            let student = client.decide(&id, VerificationAction::Reject).await?;
            println!("{} is now {}", student.id, student.status);
        }
        Command::Delete { ids } => {
            let response = client.delete(&ids).await?;
            println!("{}", response.success_message);
            for id in response.not_found_ids {
                println!("  not found: {}", id);
            }
        }
        Command::DeleteAll { yes } => {
            if !yes {
                println!("Refusing to delete every student without --yes");
                return Ok(());
            }
            let deleted = client.delete_all().await?;
            println!("Deleted {} students", deleted);
        }
        Command::Export { kind, out_dir, filters } => {
            let filter = StudentFilter::from_params(&filters.to_params())?;
            client.load().await?;
            let path = client.export(kind, &filter, &out_dir).await?;
            println!("Wrote {}", path.display());
        }
        Command::Watch => {
            client.load().await?;
            let handle = client.roster.spawn_periodic_refresh(settings.refresh.clone());
            let mut ticker = tokio::time::interval(settings.refresh.interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let count = client.roster.count().await;
                        let pending = client.pending().await.len();
                        println!("{} students, {} pending verification", count, pending);
                        print_offline_warning(&client);
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Stopping watch");
                        break;
                    }
                }
            }
            handle.abort();
        }
    }

    print_offline_warning(&client);
    Ok(())
}

fn print_offline_warning(client: &RegistryClient) {
    if let Some(warning) = client.offline_warning() {
        eprintln!("⚠ {}", warning);
    }
}

async fn print_table(client: &RegistryClient, filter: &StudentFilter, page: usize, per_page: Option<usize>) {
    let table = client.student_table(filter, page, per_page).await;

    for row in &table.students {
        let flag = if row.needs_verification { "*" } else { " " };
        println!(
            "{:>3}{} {:<24} {:<28} {:<11} {:<7} {:<28} {:<13} {:>10}",
            row.row_number,
            flag,
            row.full_name,
            row.email,
            row.mobile,
            row.gender,
            row.classes.join(", "),
            row.formatted_date,
            row.formatted_fee
        );
    }

    let markers: Vec<String> = table
        .page_info
        .markers
        .iter()
        .map(|marker| match marker {
            PageMarker::Page { number, current: true } => format!("[{}]", number),
            PageMarker::Page { number, .. } => number.to_string(),
            PageMarker::Gap => "…".to_string(),
        })
        .collect();

    println!(
        "Page {} of {} ({} students)  {}",
        table.page_info.page,
        table.page_info.total_pages,
        table.page_info.total_records,
        markers.join(" ")
    );
    if table.pending_count > 0 {
        println!("* {} awaiting verification", table.pending_count);
    }
}

async fn print_finance(client: &RegistryClient, filter: &StudentFilter) {
    let report = client.finance_report(filter).await;
    let overview = &report.overview;

    println!("Total revenue:   {}", overview.total_revenue);
    println!(
        "This month:      {} from {} registrations",
        overview.current_month_revenue, overview.current_month_count
    );
    println!("Average fee:     {}", overview.average_fee);
    println!(
        "Popular class:   {}",
        overview
            .most_popular_class
            .map(|s| s.label().to_string())
            .unwrap_or_else(|| "-".to_string())
    );

    println!("\nRevenue by class");
    for class in &report.class_revenue {
        println!("  {:<10} {:>10.0} {:>3} students {:>5.1}%", class.label, class.revenue, class.students, class.percentage);
    }

    let payments = &report.payment_breakdown;
    println!("\nPayments");
    println!("  Bank transfer  {:>3} {:>10}", payments.bank_transfer.count, payments.bank_transfer.revenue);
    println!("  Local payment  {:>3} {:>10}", payments.local_payment.count, payments.local_payment.revenue);
    println!("  Pending        {:>3} {:>10}", payments.pending.count, payments.pending.revenue);

    println!("\nLast six months");
    for month in &report.monthly_revenue {
        println!("  {:<8} {:>10} ({} registrations)", month.label, month.revenue, month.count);
    }

    println!("\nFee distribution");
    for bracket in &report.fee_distribution {
        println!("  {:>5} x {:<3} = {}", bracket.fee, bracket.count, bracket.total);
    }
}
