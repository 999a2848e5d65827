use clap::Parser;
use ledger::{
    EditDebtCmd, Ledger, MemberRole, MembershipOracle, SplitExpenseCmd, StoreMembership,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use serde_json::json;

use cli::{Cli, Command, DebtsCommand, GroupCommand};
use output::{AppError, Reply};

mod cli;
mod output;
mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(format!(
            "splitease={level},ledger={level}",
            level = settings.app.level
        ))
        .init();

    let outcome = run(cli, &settings).await;
    println!("{}", serde_json::to_string_pretty(&output::envelope(&outcome))?);

    if outcome.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

async fn connect_db(database_url: &str) -> Result<DatabaseConnection, AppError> {
    let database = sea_orm::Database::connect(database_url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

fn require_actor(actor: Option<String>) -> Result<String, AppError> {
    actor
        .filter(|actor| !actor.trim().is_empty())
        .ok_or_else(|| {
            AppError::Usage("an actor is required (--actor or SPLITEASE_ACTOR)".to_string())
        })
}

async fn require_admin(
    membership: &StoreMembership,
    group_id: &str,
    actor: &str,
) -> Result<(), AppError> {
    if membership.is_admin(group_id, actor).await? {
        Ok(())
    } else {
        Err(ledger::LedgerError::Forbidden(
            "only a group admin can manage members".to_string(),
        )
        .into())
    }
}

async fn run(cli: Cli, settings: &settings::Settings) -> Result<Reply, AppError> {
    let database_url = cli
        .database_url
        .clone()
        .unwrap_or_else(|| settings.database.url());
    let database = connect_db(&database_url).await?;

    let membership = StoreMembership::new(database.clone());
    let ledger = Ledger::builder()
        .database(database)
        .options(settings.ledger.clone())
        .build();

    match cli.command {
        // Maintenance commands run without an actor.
        Command::BackfillCurrency => backfill(&ledger).await,
        command => dispatch(command, require_actor(cli.actor)?, &ledger, &membership).await,
    }
}

async fn dispatch(
    command: Command,
    actor: String,
    ledger: &Ledger,
    membership: &StoreMembership,
) -> Result<Reply, AppError> {
    match command {
        Command::Group(group) => match group.command {
            GroupCommand::Create(args) => {
                let group_id = membership
                    .create_group(&args.name, args.currency, &actor)
                    .await?;
                Reply::new("group created", json!({ "group_id": group_id }))
            }
            GroupCommand::AddMember(args) => {
                require_admin(membership, &args.group, &actor).await?;
                let role = if args.admin {
                    MemberRole::Admin
                } else {
                    MemberRole::Member
                };
                membership
                    .upsert_member(&args.group, &args.user, role)
                    .await?;
                Reply::new(
                    "member added",
                    json!({ "group_id": args.group, "user_id": args.user, "role": role.as_str() }),
                )
            }
            GroupCommand::RemoveMember(args) => {
                require_admin(membership, &args.group, &actor).await?;
                membership.deactivate_member(&args.group, &args.user).await?;
                Reply::new(
                    "member removed",
                    json!({ "group_id": args.group, "user_id": args.user }),
                )
            }
        },
        Command::Expense(args) => {
            let mut cmd = SplitExpenseCmd::new(args.group, actor, args.amount, args.description)
                .participants(args.participants);
            if let Some(currency) = args.currency {
                cmd = cmd.currency(currency);
            }
            let debts = ledger.split_expense(cmd).await?;
            Reply::new(format!("{} debts created", debts.len()), debts)
        }
        Command::Balance(args) => {
            let balance = ledger
                .calculate_balance(&args.group, &actor, &args.other)
                .await?;
            Reply::new(
                balance.describe(&args.other),
                json!({
                    "value": balance.value.to_string(),
                    "currency": balance.currency,
                    "direction": balance.direction(),
                }),
            )
        }
        Command::Settle(args) => {
            let debt = ledger.settle(args.debt, &actor).await?;
            Reply::new("debt settled", debt)
        }
        Command::SettleAll(args) => {
            let count = ledger
                .settle_all(&args.group, &actor, &args.other, &actor)
                .await?;
            Reply::new(format!("{count} debts settled"), json!({ "count": count }))
        }
        Command::Edit(args) => {
            let mut cmd = EditDebtCmd::new(args.debt, actor);
            if let Some(amount) = args.amount {
                cmd = cmd.amount(amount);
            }
            if let Some(description) = args.description {
                cmd = cmd.description(description);
            }
            let debt = ledger.edit_debt(cmd).await?;
            Reply::new("debt updated", debt)
        }
        Command::Delete(args) => {
            ledger.delete_debt(args.debt, &actor).await?;
            Reply::new("debt deleted", json!({ "debt_id": args.debt }))
        }
        Command::Cancel(args) => {
            let debt = ledger.cancel_debt(args.debt, &actor).await?;
            Reply::new("debt cancelled", debt)
        }
        Command::Debts(debts) => {
            let records = match debts.command {
                DebtsCommand::Mine => ledger.find_by_user(&actor).await?,
                DebtsCommand::Group(args) if args.active => {
                    ledger.find_active_by_group(&args.group).await?
                }
                DebtsCommand::Group(args) => ledger.find_by_group(&args.group).await?,
            };
            Reply::new(format!("{} debts found", records.len()), records)
        }
        Command::PurgeGroup(args) => {
            let count = ledger.delete_group_debts(&args.group, &actor).await?;
            Reply::new(format!("{count} debts deleted"), json!({ "count": count }))
        }
        Command::BackfillCurrency => backfill(ledger).await,
    }
}

async fn backfill(ledger: &Ledger) -> Result<Reply, AppError> {
    let count = ledger.backfill_currency().await?;
    Reply::new(format!("{count} debts updated"), json!({ "count": count }))
}
