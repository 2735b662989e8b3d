//! Account commands - list, show, create and update balances

use std::collections::HashMap;

use anyhow::Result;
use colored::Colorize;
use dialoguer::{Input, Password};
use num_bigint::BigInt;

use super::{begin, check, corrupt_balance, invalid, print_json, print_ok};
use crate::output;
use conta_core::{cpf, Account, AccountError, OperationResult};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn with_balance(mut account: Account) -> Result<Account> {
    let id = account.id;
    account.convert_balance().map_err(|_| corrupt_balance(id))?;
    Ok(account)
}

fn print_account(account: &Account) {
    let mut table = output::create_table();
    table.add_row(vec!["ID".to_string(), account.id.to_string()]);
    table.add_row(vec!["Name".to_string(), account.name.clone()]);
    table.add_row(vec!["CPF".to_string(), account.cpf.clone()]);
    table.add_row(vec!["Balance".to_string(), account.balance.to_string()]);
    table.add_row(vec![
        "Created".to_string(),
        account.created_at.format(DATE_FORMAT).to_string(),
    ]);
    println!("{}", table);
}

pub async fn list(json: bool) -> Result<()> {
    let (conta, ctx) = begin("list")?;
    let accounts = check(conta.account_service.list(&ctx).await, json)?
        .into_iter()
        .map(with_balance)
        .collect::<Result<Vec<_>>>()?;

    if json {
        return print_ok(accounts);
    }

    if accounts.is_empty() {
        println!("No accounts found.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["ID", "Name", "CPF", "Balance", "Created"]);
    for account in &accounts {
        table.add_row(vec![
            account.id.to_string(),
            account.name.clone(),
            account.cpf.clone(),
            account.balance.to_string(),
            account.created_at.format(DATE_FORMAT).to_string(),
        ]);
    }

    println!("{}", table);
    println!("{}", format!("{} account(s)", accounts.len()).dimmed());
    Ok(())
}

pub async fn show(id: i64, json: bool) -> Result<()> {
    let (conta, ctx) = begin("show")?;
    let account = with_balance(check(conta.account_service.get_by_id(&ctx, id).await, json)?)?;

    if json {
        return print_ok(account);
    }

    print_account(&account);
    Ok(())
}

pub async fn balance(id: i64, json: bool) -> Result<()> {
    let (conta, ctx) = begin("balance")?;
    let account = with_balance(check(
        conta.account_service.get_balance_by_id(&ctx, id).await,
        json,
    )?)?;

    if json {
        return print_ok(serde_json::json!({
            "id": account.id,
            "balance": account.balance.to_string(),
        }));
    }

    println!("{} {}", "Balance:".bold(), account.balance);
    Ok(())
}

pub async fn find(cpf: &str, json: bool) -> Result<()> {
    let (conta, ctx) = begin("find")?;
    let account = with_balance(check(
        conta.account_service.get_by_identifier(&ctx, cpf).await,
        json,
    )?)?;

    if json {
        return print_ok(account);
    }

    print_account(&account);
    Ok(())
}

pub async fn create(
    name: Option<String>,
    cpf: Option<String>,
    secret: Option<String>,
    json: bool,
) -> Result<()> {
    // Prompt for whatever was not given on the command line
    let name = match name {
        Some(name) => name,
        None => Input::new().with_prompt("Name").interact_text()?,
    };
    let cpf = match cpf {
        Some(cpf) => cpf,
        None => Input::new().with_prompt("CPF").interact_text()?,
    };
    let secret = match secret {
        Some(secret) => secret,
        None => Password::new()
            .with_prompt("Secret")
            .with_confirmation("Confirm secret", "Secrets do not match")
            .interact()?,
    };

    let (conta, ctx) = begin("create")?;
    let mut account = Account::new(name, cpf, secret);
    check(conta.account_service.create(&ctx, &mut account).await, json)?;

    if json {
        return print_ok(account);
    }

    output::success("Account created");
    println!("  ID: {}", account.id);
    println!("  CPF: {}", account.cpf);
    Ok(())
}

pub async fn set_balance(id: i64, amount: &str, json: bool) -> Result<()> {
    let balance: BigInt = match amount.trim().parse() {
        Ok(balance) => balance,
        Err(_) => return invalid(AccountError::InvalidBalance, json),
    };

    let (conta, ctx) = begin("set-balance")?;
    let mut account = Account {
        id,
        ..Account::default()
    };
    account.set_balance(balance);
    check(conta.account_service.update_balance(&ctx, &account).await, json)?;

    if json {
        return print_ok(serde_json::json!({
            "id": account.id,
            "balance": account.balance.to_string(),
        }));
    }

    output::success(&format!("Balance of account {} set to {}", id, account.balance));
    Ok(())
}

/// Validate `value` and build the `check-cpf` envelope: the normalized cpf
/// as data, the raw input as context
fn cpf_report(value: &str) -> conta_core::domain::result::Result<OperationResult<String>> {
    if value.is_empty() {
        return Err(AccountError::IdentifierRequired);
    }

    let mut normalized = value.to_string();
    cpf::validate(&mut normalized)?;

    let context = HashMap::from([("input".to_string(), serde_json::json!(value))]);
    Ok(OperationResult::ok_with_context(normalized, context))
}

pub fn check_cpf(value: &str, json: bool) -> Result<()> {
    let report = check(cpf_report(value), json)?;

    if json {
        return print_json(&report);
    }

    output::success(&format!("{} is valid", report.data.unwrap_or_default()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpf_report_carries_normalized_value_and_input() {
        let report = cpf_report("529.982.247-25").unwrap();
        assert!(report.success);
        assert_eq!(report.data.as_deref(), Some("52998224725"));

        let context = report.context.unwrap();
        assert_eq!(context["input"], "529.982.247-25");
    }

    #[test]
    fn test_cpf_report_errors() {
        assert_eq!(
            cpf_report("").unwrap_err(),
            AccountError::IdentifierRequired
        );
        assert_eq!(
            cpf_report("111.111.111-11").unwrap_err(),
            AccountError::IdentifierInvalid
        );
        assert_eq!(
            cpf_report("123").unwrap_err(),
            AccountError::IdentifierSizeInvalid
        );
    }
}
