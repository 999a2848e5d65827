use clap::{Args, Parser, Subcommand};
use ledger::{Currency, Money};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "splitease")]
#[command(about = "Split shared expenses inside a group and settle the resulting debts")]
pub struct Cli {
    /// User performing the operation.
    #[arg(long, global = true, env = "SPLITEASE_ACTOR")]
    pub actor: Option<String>,

    /// Database connection string, overrides the configured database.
    #[arg(long, global = true, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create groups and manage their members.
    Group(Group),
    /// Split an expense paid by the actor.
    Expense(ExpenseArgs),
    /// Net balance of the actor towards another member.
    Balance(PairArgs),
    /// Settle a single debt.
    Settle(DebtArgs),
    /// Settle every active debt with another member (net creditor only).
    SettleAll(PairArgs),
    /// Change the amount or the description of a debt (creditor only).
    Edit(EditArgs),
    /// Delete a debt (creditor or debtor).
    Delete(DebtArgs),
    /// Cancel a debt.
    Cancel(DebtArgs),
    /// List debts.
    Debts(Debts),
    /// Delete every debt of a group (group admins only).
    PurgeGroup(GroupArgs),
    /// Give a currency to debts stored without one.
    BackfillCurrency,
}

#[derive(Args, Debug)]
pub struct Group {
    #[command(subcommand)]
    pub command: GroupCommand,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Create a group; the actor becomes its admin.
    Create(GroupCreateArgs),
    /// Add a member, or reactivate a former one (group admins only).
    AddMember(MemberArgs),
    /// Deactivate a member (group admins only).
    RemoveMember(MemberArgs),
}

#[derive(Args, Debug)]
pub struct GroupCreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub currency: Option<Currency>,
}

#[derive(Args, Debug)]
pub struct MemberArgs {
    #[arg(long)]
    pub group: String,
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub admin: bool,
}

#[derive(Args, Debug)]
pub struct GroupArgs {
    #[arg(long)]
    pub group: String,
}

#[derive(Args, Debug)]
pub struct ExpenseArgs {
    #[arg(long)]
    pub group: String,
    /// Amount with at most two decimals, e.g. `12.50`.
    #[arg(long)]
    pub amount: Money,
    #[arg(long)]
    pub description: String,
    /// Defaults to the group currency.
    #[arg(long)]
    pub currency: Option<Currency>,
    /// Members sharing the expense; comma separated or repeated.
    #[arg(long = "participant", value_delimiter = ',', required = true)]
    pub participants: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PairArgs {
    #[arg(long)]
    pub group: String,
    /// The other member.
    #[arg(long = "with")]
    pub other: String,
}

#[derive(Args, Debug)]
pub struct DebtArgs {
    #[arg(long)]
    pub debt: Uuid,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    #[arg(long)]
    pub debt: Uuid,
    #[arg(long)]
    pub amount: Option<Money>,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct Debts {
    #[command(subcommand)]
    pub command: DebtsCommand,
}

#[derive(Subcommand, Debug)]
pub enum DebtsCommand {
    /// Debts of the actor across all groups.
    Mine,
    /// Debts of a group.
    Group(GroupListArgs),
}

#[derive(Args, Debug)]
pub struct GroupListArgs {
    #[arg(long)]
    pub group: String,
    /// Only active debts.
    #[arg(long)]
    pub active: bool,
}
