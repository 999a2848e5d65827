use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use ledger::{
    BalanceDirection, Currency, DebtRecord, DebtStatus, EditDebtCmd, GroupProfile, Ledger,
    LedgerError, LedgerOptions, MemberRole, MembershipOracle, Money, RemainderPolicy,
    ResultLedger, SplitExpenseCmd, StoreMembership,
};
use migration::MigratorTrait;
use uuid::Uuid;

struct Fixture {
    ledger: Ledger,
    membership: StoreMembership,
    db: DatabaseConnection,
    group: String,
}

async fn connect() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

/// Group created by `alice` (admin) with `bob` and `carol` as members.
async fn fixture_with(options: LedgerOptions, currency: Option<Currency>) -> Fixture {
    let db = connect().await;
    let membership = StoreMembership::new(db.clone());
    let group = membership
        .create_group("Flat", currency, "alice")
        .await
        .unwrap();
    for user in ["bob", "carol"] {
        membership
            .upsert_member(&group, user, MemberRole::Member)
            .await
            .unwrap();
    }
    let ledger = Ledger::builder()
        .database(db.clone())
        .options(options)
        .build();
    Fixture {
        ledger,
        membership,
        db,
        group,
    }
}

async fn fixture() -> Fixture {
    fixture_with(LedgerOptions::default(), None).await
}

fn money(raw: &str) -> Money {
    raw.parse().unwrap()
}

async fn split(
    fx: &Fixture,
    payer: &str,
    amount: &str,
    participants: &[&str],
) -> Vec<DebtRecord> {
    fx.ledger
        .split_expense(
            SplitExpenseCmd::new(&fx.group, payer, money(amount), "Groceries")
                .participants(participants.iter().copied()),
        )
        .await
        .unwrap()
}

/// One debt of `debtor` towards `creditor` for `amount`.
async fn single_debt(fx: &Fixture, creditor: &str, debtor: &str, amount: &str) -> DebtRecord {
    let total = money(amount) + money(amount);
    let mut debts = fx
        .ledger
        .split_expense(
            SplitExpenseCmd::new(&fx.group, creditor, total, "Taxi").participant(debtor),
        )
        .await
        .unwrap();
    assert_eq!(debts.len(), 1);
    debts.remove(0)
}

#[tokio::test]
async fn split_creates_one_debt_per_debtor() {
    let fx = fixture().await;

    let debts = split(&fx, "alice", "30.00", &["alice", "bob", "carol"]).await;

    assert_eq!(debts.len(), 2);
    for debt in &debts {
        assert_eq!(debt.creditor_id, "alice");
        assert_ne!(debt.debtor_id, "alice");
        assert_eq!(debt.amount, money("10.00"));
        assert_eq!(debt.original_amount, money("30.00"));
        assert_eq!(debt.currency, Currency::Sar);
        assert_eq!(debt.status, DebtStatus::Active);
        assert_eq!(debt.created_by, "alice");
        assert_eq!(debt.description, "Groceries");
        assert!(debt.settled_at.is_none());
    }

    let stored = fx.ledger.find_by_group(&fx.group).await.unwrap();
    assert_eq!(stored.len(), 2);
    let stored_debt = fx.ledger.debt(debts[0].id).await.unwrap();
    assert_eq!(stored_debt.amount, debts[0].amount);
    assert_eq!(stored_debt.debtor_id, debts[0].debtor_id);
}

#[tokio::test]
async fn split_resolves_currency_from_expense_then_group() {
    let fx = fixture_with(LedgerOptions::default(), Some(Currency::Eur)).await;

    let from_group = split(&fx, "alice", "10.00", &["bob"]).await;
    assert_eq!(from_group[0].currency, Currency::Eur);

    let explicit = fx
        .ledger
        .split_expense(
            SplitExpenseCmd::new(&fx.group, "alice", money("10.00"), "Museum")
                .participant("bob")
                .currency(Currency::Aed),
        )
        .await
        .unwrap();
    assert_eq!(explicit[0].currency, Currency::Aed);
}

#[tokio::test]
async fn round_robin_remainder_adds_up_exactly() {
    let options = LedgerOptions {
        remainder: RemainderPolicy::RoundRobin,
        ..LedgerOptions::default()
    };
    let fx = fixture_with(options, None).await;

    let debts = split(&fx, "alice", "10.01", &["bob", "carol"]).await;

    assert_eq!(debts[0].debtor_id, "bob");
    assert_eq!(debts[0].amount, money("3.34"));
    assert_eq!(debts[1].debtor_id, "carol");
    assert_eq!(debts[1].amount, money("3.33"));
}

#[tokio::test]
async fn sole_participant_creates_nothing() {
    let fx = fixture().await;

    let debts = split(&fx, "alice", "12.00", &["alice"]).await;

    assert!(debts.is_empty());
    assert!(fx.ledger.find_by_group(&fx.group).await.unwrap().is_empty());
}

#[tokio::test]
async fn non_member_participant_rejects_the_whole_expense() {
    let fx = fixture().await;

    let err = fx
        .ledger
        .split_expense(
            SplitExpenseCmd::new(&fx.group, "alice", money("30.00"), "Dinner")
                .participants(["bob", "mallory"]),
        )
        .await
        .unwrap_err();

    assert!(matches!(&err, LedgerError::Validation(msg) if msg.contains("mallory")));
    assert!(fx.ledger.find_by_group(&fx.group).await.unwrap().is_empty());
}

#[tokio::test]
async fn deactivated_member_cannot_take_part() {
    let fx = fixture().await;
    fx.membership
        .deactivate_member(&fx.group, "carol")
        .await
        .unwrap();

    let err = fx
        .ledger
        .split_expense(
            SplitExpenseCmd::new(&fx.group, "alice", money("30.00"), "Dinner")
                .participants(["bob", "carol"]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn split_checks_payer_and_group() {
    let fx = fixture().await;

    let err = fx
        .ledger
        .split_expense(
            SplitExpenseCmd::new(&fx.group, "alice", money("30.00"), "Dinner")
                .participant("bob")
                .actor("bob"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");

    let err = fx
        .ledger
        .split_expense(
            SplitExpenseCmd::new(&fx.group, "mallory", money("30.00"), "Dinner")
                .participant("bob"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_MEMBER");

    let err = fx
        .ledger
        .split_expense(
            SplitExpenseCmd::new(Uuid::new_v4().to_string(), "alice", money("30.00"), "Dinner")
                .participant("bob"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn split_validates_input() {
    let fx = fixture().await;

    let no_participants =
        SplitExpenseCmd::new(&fx.group, "alice", money("30.00"), "Dinner");
    let blank_description =
        SplitExpenseCmd::new(&fx.group, "alice", money("30.00"), "   ").participant("bob");
    let zero_amount = SplitExpenseCmd::new(&fx.group, "alice", Money::ZERO, "Dinner")
        .participant("bob");
    let long_description =
        SplitExpenseCmd::new(&fx.group, "alice", money("30.00"), "x".repeat(201))
            .participant("bob");

    for cmd in [
        no_participants,
        blank_description,
        zero_amount,
        long_description,
    ] {
        let err = fx.ledger.split_expense(cmd).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
    assert!(fx.ledger.find_by_group(&fx.group).await.unwrap().is_empty());
}

#[tokio::test]
async fn balance_nets_both_directions() {
    let fx = fixture().await;
    single_debt(&fx, "alice", "bob", "30.00").await;
    single_debt(&fx, "bob", "alice", "10.00").await;

    let balance = fx
        .ledger
        .calculate_balance(&fx.group, "alice", "bob")
        .await
        .unwrap();
    assert_eq!(balance.value, money("20.00"));
    assert_eq!(balance.currency, Currency::Sar);
    assert_eq!(balance.direction(), BalanceDirection::OwedToViewer);
    assert_eq!(balance.describe("bob"), "User bob owes you 20.00 SAR.");

    let mirrored = fx
        .ledger
        .calculate_balance(&fx.group, "bob", "alice")
        .await
        .unwrap();
    assert_eq!(mirrored.value, money("-20.00"));
    assert_eq!(mirrored.describe("alice"), "You owe user alice 20.00 SAR.");

    let nothing = fx
        .ledger
        .calculate_balance(&fx.group, "alice", "carol")
        .await
        .unwrap();
    assert_eq!(nothing.value, Money::ZERO);
    assert_eq!(nothing.currency, Currency::Usd);
    assert_eq!(nothing.direction(), BalanceDirection::SettledUp);
}

#[tokio::test]
async fn balance_ignores_settled_debts_and_other_groups() {
    let fx = fixture().await;
    let settled = single_debt(&fx, "alice", "bob", "30.00").await;
    single_debt(&fx, "alice", "bob", "5.00").await;
    fx.ledger.settle(settled.id, "bob").await.unwrap();

    let other_group = fx
        .membership
        .create_group("Trip", None, "alice")
        .await
        .unwrap();
    fx.membership
        .upsert_member(&other_group, "bob", MemberRole::Member)
        .await
        .unwrap();
    fx.ledger
        .split_expense(
            SplitExpenseCmd::new(&other_group, "alice", money("100.00"), "Hotel")
                .participant("bob"),
        )
        .await
        .unwrap();

    let balance = fx
        .ledger
        .calculate_balance(&fx.group, "alice", "bob")
        .await
        .unwrap();
    assert_eq!(balance.value, money("5.00"));
}

#[tokio::test]
async fn concurrent_settles_succeed_once() {
    let fx = fixture().await;
    let debt = single_debt(&fx, "alice", "bob", "10.00").await;

    let (first, second) = tokio::join!(
        fx.ledger.settle(debt.id, "alice"),
        fx.ledger.settle(debt.id, "bob"),
    );

    let outcomes = [first, second];
    let settled: Vec<_> = outcomes.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(settled.len(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(LedgerError::AlreadySettled(_))))
    );

    let stored = fx.ledger.debt(debt.id).await.unwrap();
    assert_eq!(stored.status, DebtStatus::Settled);
    assert!(stored.settled_at.is_some());
}

#[tokio::test]
async fn settled_debt_is_never_settled_again() {
    let fx = fixture().await;
    let debt = single_debt(&fx, "alice", "bob", "10.00").await;

    let settled = fx.ledger.settle(debt.id, "bob").await.unwrap();
    assert_eq!(settled.status, DebtStatus::Settled);
    let settled_at = fx.ledger.debt(debt.id).await.unwrap().settled_at;
    assert!(settled_at.is_some());

    tokio::time::sleep(Duration::from_millis(5)).await;
    let err = fx.ledger.settle(debt.id, "alice").await.unwrap_err();
    assert!(matches!(&err, LedgerError::AlreadySettled(msg) if msg.contains("settled")));
    assert_eq!(
        fx.ledger.debt(debt.id).await.unwrap().settled_at,
        settled_at
    );
}

#[tokio::test]
async fn settle_requires_a_party() {
    let fx = fixture().await;
    let debt = single_debt(&fx, "alice", "bob", "10.00").await;

    let err = fx.ledger.settle(debt.id, "carol").await.unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");
    assert_eq!(
        fx.ledger.debt(debt.id).await.unwrap().status,
        DebtStatus::Active
    );

    let err = fx.ledger.settle(Uuid::new_v4(), "alice").await.unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn settle_all_is_reserved_to_the_net_creditor() {
    let fx = fixture().await;
    // alice owes bob 30, bob owes alice 10: alice is at -20.
    single_debt(&fx, "bob", "alice", "30.00").await;
    single_debt(&fx, "alice", "bob", "10.00").await;

    let err = fx
        .ledger
        .settle_all(&fx.group, "alice", "bob", "alice")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");
    assert_eq!(
        fx.ledger.find_active_by_group(&fx.group).await.unwrap().len(),
        2
    );

    let err = fx
        .ledger
        .settle_all(&fx.group, "bob", "alice", "alice")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");

    let count = fx
        .ledger
        .settle_all(&fx.group, "bob", "alice", "bob")
        .await
        .unwrap();
    assert_eq!(count, 2);

    let debts = fx.ledger.find_by_group(&fx.group).await.unwrap();
    assert!(debts.iter().all(|d| d.status == DebtStatus::Settled));
    let settled_at = debts[0].settled_at;
    assert!(settled_at.is_some());
    assert!(debts.iter().all(|d| d.settled_at == settled_at));

    let balance = fx
        .ledger
        .calculate_balance(&fx.group, "alice", "bob")
        .await
        .unwrap();
    assert_eq!(balance.value, Money::ZERO);
}

#[tokio::test]
async fn settle_all_without_debts_is_a_no_op() {
    let fx = fixture().await;
    single_debt(&fx, "alice", "bob", "10.00").await;

    let count = fx
        .ledger
        .settle_all(&fx.group, "alice", "carol", "alice")
        .await
        .unwrap();
    assert_eq!(count, 0);

    let err = fx
        .ledger
        .settle_all(&fx.group, "alice", "alice", "alice")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn settle_all_skips_already_settled_debts() {
    let fx = fixture().await;
    let first = single_debt(&fx, "alice", "bob", "10.00").await;
    single_debt(&fx, "alice", "bob", "5.00").await;
    let settled_at = fx.ledger.settle(first.id, "bob").await.unwrap().settled_at;

    let count = fx
        .ledger
        .settle_all(&fx.group, "alice", "bob", "alice")
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(fx.ledger.debt(first.id).await.unwrap().settled_at, settled_at);
}

#[tokio::test]
async fn delete_is_reserved_to_the_parties() {
    let fx = fixture().await;
    let debt = single_debt(&fx, "alice", "bob", "10.00").await;

    let err = fx.ledger.delete_debt(debt.id, "carol").await.unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");
    let untouched = fx.ledger.debt(debt.id).await.unwrap();
    assert_eq!(untouched.status, DebtStatus::Active);
    assert_eq!(untouched.amount, debt.amount);

    fx.ledger.delete_debt(debt.id, "bob").await.unwrap();
    let err = fx.ledger.debt(debt.id).await.unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn delete_ignores_status() {
    let fx = fixture().await;
    let debt = single_debt(&fx, "alice", "bob", "10.00").await;
    fx.ledger.settle(debt.id, "alice").await.unwrap();

    fx.ledger.delete_debt(debt.id, "alice").await.unwrap();
    assert!(fx.ledger.find_by_group(&fx.group).await.unwrap().is_empty());
}

#[tokio::test]
async fn edit_is_reserved_to_the_creditor() {
    let fx = fixture().await;
    let debt = single_debt(&fx, "alice", "bob", "10.00").await;

    let err = fx
        .ledger
        .edit_debt(EditDebtCmd::new(debt.id, "bob").amount(money("1.00")))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");

    let edited = fx
        .ledger
        .edit_debt(
            EditDebtCmd::new(debt.id, "alice")
                .amount(money("12.50"))
                .description("  Taxi to the airport "),
        )
        .await
        .unwrap();
    assert_eq!(edited.amount, money("12.50"));
    assert_eq!(edited.description, "Taxi to the airport");
    assert_eq!(edited.status, DebtStatus::Active);

    let stored = fx.ledger.debt(debt.id).await.unwrap();
    assert_eq!(stored.amount, money("12.50"));
    assert_eq!(stored.description, "Taxi to the airport");
    assert_eq!(stored.original_amount, debt.original_amount);
}

#[tokio::test]
async fn edit_rejects_empty_or_invalid_changes() {
    let fx = fixture().await;
    let debt = single_debt(&fx, "alice", "bob", "10.00").await;

    for cmd in [
        EditDebtCmd::new(debt.id, "alice"),
        EditDebtCmd::new(debt.id, "alice").amount(Money::ZERO),
        EditDebtCmd::new(debt.id, "alice").description(" "),
    ] {
        let err = fx.ledger.edit_debt(cmd).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    let err = fx
        .ledger
        .edit_debt(EditDebtCmd::new(Uuid::new_v4(), "alice").amount(money("1.00")))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn settled_debt_stays_editable_by_default() {
    let fx = fixture().await;
    let debt = single_debt(&fx, "alice", "bob", "10.00").await;
    fx.ledger.settle(debt.id, "bob").await.unwrap();

    let edited = fx
        .ledger
        .edit_debt(EditDebtCmd::new(debt.id, "alice").description("Cab"))
        .await
        .unwrap();
    assert_eq!(edited.status, DebtStatus::Settled);
    assert_eq!(edited.description, "Cab");
}

#[tokio::test]
async fn locked_terminal_edits_are_rejected() {
    let options = LedgerOptions {
        lock_terminal_edits: true,
        ..LedgerOptions::default()
    };
    let fx = fixture_with(options, None).await;
    let debt = single_debt(&fx, "alice", "bob", "10.00").await;
    fx.ledger.settle(debt.id, "bob").await.unwrap();

    let err = fx
        .ledger
        .edit_debt(EditDebtCmd::new(debt.id, "alice").amount(money("1.00")))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "ALREADY_SETTLED");
    assert_eq!(
        fx.ledger.debt(debt.id).await.unwrap().amount,
        money("10.00")
    );
}

#[tokio::test]
async fn cancel_is_not_implemented() {
    let fx = fixture().await;
    let debt = single_debt(&fx, "alice", "bob", "10.00").await;

    let err = fx.ledger.cancel_debt(debt.id, "alice").await.unwrap_err();
    assert_eq!(err.code(), "NOT_IMPLEMENTED");
    assert_eq!(
        fx.ledger.debt(debt.id).await.unwrap().status,
        DebtStatus::Active
    );
}

#[tokio::test]
async fn listings_are_newest_first() {
    let fx = fixture().await;
    let oldest = single_debt(&fx, "alice", "bob", "1.00").await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    let middle = single_debt(&fx, "carol", "alice", "2.00").await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    let newest = single_debt(&fx, "bob", "carol", "3.00").await;
    fx.ledger.settle(middle.id, "alice").await.unwrap();

    let ids = |debts: Vec<DebtRecord>| debts.into_iter().map(|d| d.id).collect::<Vec<_>>();

    assert_eq!(
        ids(fx.ledger.find_by_group(&fx.group).await.unwrap()),
        vec![newest.id, middle.id, oldest.id]
    );
    assert_eq!(
        ids(fx.ledger.find_active_by_group(&fx.group).await.unwrap()),
        vec![newest.id, oldest.id]
    );
    assert_eq!(
        ids(fx.ledger.find_by_user("alice").await.unwrap()),
        vec![middle.id, oldest.id]
    );
    assert!(fx.ledger.find_by_user("mallory").await.unwrap().is_empty());
}

#[tokio::test]
async fn user_listing_spans_groups() {
    let fx = fixture().await;
    single_debt(&fx, "alice", "bob", "1.00").await;

    let other_group = fx
        .membership
        .create_group("Trip", Some(Currency::Try), "bob")
        .await
        .unwrap();
    fx.membership
        .upsert_member(&other_group, "alice", MemberRole::Member)
        .await
        .unwrap();
    fx.ledger
        .split_expense(
            SplitExpenseCmd::new(&other_group, "bob", money("50.00"), "Hotel")
                .participant("alice"),
        )
        .await
        .unwrap();

    let debts = fx.ledger.find_by_user("alice").await.unwrap();
    assert_eq!(debts.len(), 2);
    assert!(debts.iter().any(|d| d.group_id == other_group));
    assert!(debts.iter().any(|d| d.currency == Currency::Try));
}

#[tokio::test]
async fn purging_group_debts_requires_an_admin() {
    let fx = fixture().await;
    split(&fx, "alice", "30.00", &["bob", "carol"]).await;
    let settled = single_debt(&fx, "bob", "carol", "4.00").await;
    fx.ledger.settle(settled.id, "carol").await.unwrap();

    let err = fx
        .ledger
        .delete_group_debts(&fx.group, "bob")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");
    assert_eq!(fx.ledger.find_by_group(&fx.group).await.unwrap().len(), 3);

    let count = fx
        .ledger
        .delete_group_debts(&fx.group, "alice")
        .await
        .unwrap();
    assert_eq!(count, 3);
    assert!(fx.ledger.find_by_group(&fx.group).await.unwrap().is_empty());

    fx.membership.delete_group(&fx.group).await.unwrap();
    assert!(fx.membership.group(&fx.group).await.unwrap().is_none());
}

#[tokio::test]
async fn backfill_assigns_group_or_default_currency() {
    let fx = fixture_with(LedgerOptions::default(), Some(Currency::Eur)).await;
    let in_eur_group = single_debt(&fx, "alice", "bob", "10.00").await;

    let plain_group = fx
        .membership
        .create_group("Plain", None, "alice")
        .await
        .unwrap();
    fx.membership
        .upsert_member(&plain_group, "bob", MemberRole::Member)
        .await
        .unwrap();
    let mut in_plain_group = fx
        .ledger
        .split_expense(
            SplitExpenseCmd::new(&plain_group, "alice", money("4.00"), "Snacks")
                .participant("bob")
                .currency(Currency::Usd),
        )
        .await
        .unwrap();
    let in_plain_group = in_plain_group.remove(0);

    let backend = fx.db.get_database_backend();
    fx.db
        .execute(Statement::from_string(
            backend,
            "UPDATE debts SET currency = ''".to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(fx.ledger.backfill_currency().await.unwrap(), 2);
    assert_eq!(
        fx.ledger.debt(in_eur_group.id).await.unwrap().currency,
        Currency::Eur
    );
    assert_eq!(
        fx.ledger.debt(in_plain_group.id).await.unwrap().currency,
        Currency::Sar
    );

    assert_eq!(fx.ledger.backfill_currency().await.unwrap(), 0);
}

#[tokio::test]
async fn group_bootstrap_sets_roles() {
    let fx = fixture().await;

    assert!(fx.membership.is_admin(&fx.group, "alice").await.unwrap());
    assert!(!fx.membership.is_admin(&fx.group, "bob").await.unwrap());
    assert!(fx.membership.is_member(&fx.group, "bob").await.unwrap());
    assert!(!fx.membership.is_member(&fx.group, "mallory").await.unwrap());

    fx.membership
        .upsert_member(&fx.group, "bob", MemberRole::Admin)
        .await
        .unwrap();
    assert!(fx.membership.is_admin(&fx.group, "bob").await.unwrap());

    let err = fx
        .membership
        .upsert_member(&Uuid::new_v4().to_string(), "bob", MemberRole::Member)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    let err = fx
        .membership
        .create_group("  ", None, "alice")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
}

/// Oracle answering from a fixed member list, without any group table.
struct FixedMembers {
    group_id: String,
    members: Vec<String>,
}

#[async_trait]
impl MembershipOracle for FixedMembers {
    async fn group(&self, group_id: &str) -> ResultLedger<Option<GroupProfile>> {
        Ok((group_id == self.group_id).then(|| GroupProfile {
            id: group_id.to_string(),
            currency: Some(Currency::Egp),
        }))
    }

    async fn is_member(&self, group_id: &str, user_id: &str) -> ResultLedger<bool> {
        Ok(group_id == self.group_id && self.members.iter().any(|m| m == user_id))
    }

    async fn is_admin(&self, _group_id: &str, _user_id: &str) -> ResultLedger<bool> {
        Ok(false)
    }
}

#[tokio::test]
async fn custom_oracle_can_be_plugged() {
    let db = connect().await;
    let ledger = Ledger::builder()
        .database(db)
        .membership(Arc::new(FixedMembers {
            group_id: "external".to_string(),
            members: vec!["dan".to_string(), "eve".to_string()],
        }))
        .build();

    let debts = ledger
        .split_expense(
            SplitExpenseCmd::new("external", "dan", money("9.00"), "Pizza").participant("eve"),
        )
        .await
        .unwrap();
    assert_eq!(debts.len(), 1);
    assert_eq!(debts[0].amount, money("4.50"));
    assert_eq!(debts[0].currency, Currency::Egp);

    let err = ledger
        .delete_group_debts("external", "dan")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");
}

#[tokio::test]
async fn largest_amounts_still_net_in_range() {
    let fx = fixture().await;
    split(&fx, "alice", "1000000000.00", &["alice", "bob"]).await;
    split(&fx, "alice", "1000000000.00", &["alice", "bob"]).await;

    let balance = fx
        .ledger
        .calculate_balance(&fx.group, "alice", "bob")
        .await
        .unwrap();

    assert_eq!(balance.value, money("1000000000.00"));
    assert_eq!(balance.direction(), BalanceDirection::OwedToViewer);
}

#[tokio::test]
async fn amounts_above_the_cap_are_rejected() {
    let fx = fixture().await;

    for amount in ["1000000000.01", "92233720368547758.07"] {
        let err = fx
            .ledger
            .split_expense(
                SplitExpenseCmd::new(&fx.group, "alice", money(amount), "Yacht")
                    .participants(["alice", "bob"]),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
    assert!(fx.ledger.find_by_group(&fx.group).await.unwrap().is_empty());

    let debt = single_debt(&fx, "alice", "bob", "10.00").await;
    let err = fx
        .ledger
        .edit_debt(EditDebtCmd::new(debt.id, "alice").amount(money("1000000000.01")))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn corrupt_stored_rows_are_internal_errors() {
    let fx = fixture().await;
    let debt = single_debt(&fx, "alice", "bob", "10.00").await;

    let backend = fx.db.get_database_backend();
    fx.db
        .execute(Statement::from_string(
            backend,
            "UPDATE debts SET status = 'bogus'".to_string(),
        ))
        .await
        .unwrap();

    let err = fx.ledger.find_by_group(&fx.group).await.unwrap_err();
    assert_eq!(err.code(), "INTERNAL_ERROR");
    assert_eq!(err.public_message(), "internal error");

    let err = fx.ledger.debt(debt.id).await.unwrap_err();
    assert!(err.is_internal());
}

#[tokio::test]
async fn padded_actor_matches_the_payer() {
    let fx = fixture().await;

    let debts = fx
        .ledger
        .split_expense(
            SplitExpenseCmd::new(&fx.group, "alice", money("20.00"), "Cinema")
                .actor(" alice ")
                .participants(["alice", "bob"]),
        )
        .await
        .unwrap();

    assert_eq!(debts.len(), 1);
    assert_eq!(debts[0].creditor_id, "alice");
    assert_eq!(debts[0].created_by, "alice");
    let stored = fx.ledger.debt(debts[0].id).await.unwrap();
    assert_eq!(stored.created_by, "alice");
}
