//! The demo account chaincode executed by simulated peers.
//!
//! State is a map from account name to integer balance. Execution is
//! split into a read phase (producing the response payload) and a write
//! set applied at commit time, mirroring endorse-then-commit semantics.

use std::collections::BTreeMap;

/// Write set produced by a committing invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LedgerWrite {
    CreateAccount { name: String, balance: i64 },
    Transfer { from: String, to: String, amount: i64 },
}

/// Execute `fcn(args)` against committed state. Returns the response
/// payload and the write set to apply on commit, or a chaincode error
/// message.
///
/// `admin` is the enrollment id of the instantiating transactor and
/// `creator` the one invoking now. Only the admin may create accounts
/// or list them; transfers and balance queries are open to the admin
/// and to the holder of the account in question.
pub(crate) fn execute(
    accounts: &BTreeMap<String, i64>,
    admin: Option<&str>,
    creator: &str,
    fcn: &str,
    args: &[String],
) -> Result<(Vec<u8>, Option<LedgerWrite>), String> {
    let is_admin = admin == Some(creator);
    match fcn {
        "init" => init_accounts(args).map(|_| (Vec::new(), None)),
        "create_account" => create_account(accounts, args, creator, is_admin),
        "transfer" => transfer(accounts, args, creator, is_admin),
        "query_balance" => query_balance(accounts, args, creator, is_admin),
        "query_account_names" => query_account_names(accounts, args, is_admin),
        other => Err(format!("unknown chaincode function \"{}\"", other)),
    }
}

/// Apply a write set to committed state. Endorsement already validated
/// the write against the state it read; a conflicting interleaving shows
/// up here as saturating arithmetic rather than a panic.
pub(crate) fn apply(accounts: &mut BTreeMap<String, i64>, write: &LedgerWrite) {
    match write {
        LedgerWrite::CreateAccount { name, balance } => {
            accounts.insert(name.clone(), *balance);
        }
        LedgerWrite::Transfer { from, to, amount } => {
            if let Some(balance) = accounts.get_mut(from) {
                *balance = balance.saturating_sub(*amount);
            }
            if let Some(balance) = accounts.get_mut(to) {
                *balance = balance.saturating_add(*amount);
            }
        }
    }
}

/// Parse init arguments (name, balance pairs) into seeded state.
pub(crate) fn init_accounts(args: &[String]) -> Result<BTreeMap<String, i64>, String> {
    if args.len() % 2 != 0 {
        return Err(format!(
            "init expects name and balance pairs, got {} argument(s)",
            args.len()
        ));
    }
    let mut accounts = BTreeMap::new();
    for pair in args.chunks(2) {
        let name = pair[0].as_str();
        if name.is_empty() {
            return Err("account name must not be empty".to_string());
        }
        let balance = parse_amount(&pair[1], "initial balance")?;
        if balance < 0 {
            return Err(format!(
                "Can't create an account with a negative balance ({})",
                balance
            ));
        }
        if accounts.insert(name.to_string(), balance).is_some() {
            return Err(format!("Account with name {} already exists", name));
        }
    }
    Ok(accounts)
}

fn expect_args(args: &[String], expected: usize, fcn: &str) -> Result<(), String> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(format!(
            "{} expects {} argument(s), got {}",
            fcn,
            expected,
            args.len()
        ))
    }
}

fn parse_amount(raw: &str, what: &str) -> Result<i64, String> {
    raw.parse::<i64>()
        .map_err(|_| format!("Expecting integer value for {}, got \"{}\"", what, raw))
}

fn create_account(
    accounts: &BTreeMap<String, i64>,
    args: &[String],
    creator: &str,
    is_admin: bool,
) -> Result<(Vec<u8>, Option<LedgerWrite>), String> {
    expect_args(args, 2, "create_account")?;
    if !is_admin {
        return Err(format!(
            "Could not create account; transactor \"{}\" is not the registered admin user",
            creator
        ));
    }
    let name = args[0].as_str();
    if name.is_empty() {
        return Err("account name must not be empty".to_string());
    }
    let balance = parse_amount(&args[1], "initial balance")?;
    if balance < 0 {
        return Err(format!(
            "Can't create an account with a negative balance ({})",
            balance
        ));
    }
    if accounts.contains_key(name) {
        return Err(format!("Account with name {} already exists", name));
    }
    Ok((
        Vec::new(),
        Some(LedgerWrite::CreateAccount {
            name: name.to_string(),
            balance,
        }),
    ))
}

fn transfer(
    accounts: &BTreeMap<String, i64>,
    args: &[String],
    creator: &str,
    is_admin: bool,
) -> Result<(Vec<u8>, Option<LedgerWrite>), String> {
    expect_args(args, 3, "transfer")?;
    let from = args[0].as_str();
    let to = args[1].as_str();
    // The account holder may move their own funds, the admin anyone's.
    if !is_admin && creator != from {
        return Err(format!(
            "User \"{}\" is not authorized to transfer from account \"{}\"",
            creator, from
        ));
    }
    let amount = parse_amount(&args[2], "transfer amount")?;
    if amount < 0 {
        return Err(format!("Can't transfer a negative amount ({})", amount));
    }
    let from_balance = accounts
        .get(from)
        .ok_or_else(|| format!("Account with name {} does not exist", from))?;
    if !accounts.contains_key(to) {
        return Err(format!("Account with name {} does not exist", to));
    }
    if *from_balance < amount {
        return Err(format!(
            "Can't transfer; \"from\" account balance ({}) is less than transfer amount ({})",
            from_balance, amount
        ));
    }
    Ok((
        Vec::new(),
        Some(LedgerWrite::Transfer {
            from: from.to_string(),
            to: to.to_string(),
            amount,
        }),
    ))
}

fn query_balance(
    accounts: &BTreeMap<String, i64>,
    args: &[String],
    creator: &str,
    is_admin: bool,
) -> Result<(Vec<u8>, Option<LedgerWrite>), String> {
    expect_args(args, 1, "query_balance")?;
    if !is_admin && creator != args[0] {
        return Err(format!(
            "User \"{}\" is not authorized to query account \"{}\"",
            creator, args[0]
        ));
    }
    let balance = accounts
        .get(args[0].as_str())
        .ok_or_else(|| format!("Account with name {} does not exist", args[0]))?;
    Ok((balance.to_string().into_bytes(), None))
}

fn query_account_names(
    accounts: &BTreeMap<String, i64>,
    args: &[String],
    is_admin: bool,
) -> Result<(Vec<u8>, Option<LedgerWrite>), String> {
    expect_args(args, 0, "query_account_names")?;
    if !is_admin {
        return Err("Only admin user is authorized to query_account_names".to_string());
    }
    let names: Vec<&str> = accounts.keys().map(String::as_str).collect();
    let payload = serde_json::to_vec(&names).map_err(|e| e.to_string())?;
    Ok((payload, None))
}
