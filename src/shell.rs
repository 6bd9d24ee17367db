//! Line-oriented console over a [`Ledger`]. Reads choices and values from any
//! `BufRead`, renders outcomes to any `Write`.

use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::Result;

use crate::engine::{AccountHandle, Amount, Ledger, LedgerError, TransferOutcome};

pub struct Shell<'a, R, W> {
    ledger: &'a Ledger,
    input: R,
    output: W,
}

/// What the account menu wants the caller to do next.
enum Session {
    Continue,
    Logout,
    Quit,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(ledger: &'a Ledger, input: R, output: W) -> Self {
        Shell {
            ledger,
            input,
            output,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs the top-level menu until Exit or end of input.
    pub fn run(&mut self) -> Result<()> {
        log::debug!("Console started");
        loop {
            writeln!(self.output, "=== Simple Bank App ===")?;
            writeln!(self.output, "1. Register")?;
            writeln!(self.output, "2. Login")?;
            writeln!(self.output, "3. Export accounts (CSV)")?;
            writeln!(self.output, "4. Exit")?;

            let Some(choice) = self.prompt("Choose option: ")? else {
                break;
            };
            match choice.as_str() {
                "1" => {
                    if !self.register()? {
                        break;
                    }
                }
                "2" => {
                    if !self.login()? {
                        break;
                    }
                }
                "3" => self.ledger.write_snapshots(&mut self.output)?,
                "4" => {
                    writeln!(self.output, "Goodbye!")?;
                    break;
                }
                _ => writeln!(self.output, "Invalid choice.")?,
            }
        }
        self.output.flush()?;
        log::debug!("Console finished");
        Ok(())
    }

    /// Returns false when input ran out.
    fn register(&mut self) -> Result<bool> {
        let Some(username) = self.prompt("Choose username: ")? else {
            return Ok(false);
        };
        // Fail early before asking for the rest
        if let Err(e) = self.ledger.directory().ensure_available(&username) {
            self.render_error(&e)?;
            return Ok(true);
        }
        let Some(password) = self.prompt_secret("Enter password: ")? else {
            return Ok(false);
        };
        let Some(agency) = self.prompt("Enter agency: ")? else {
            return Ok(false);
        };

        match self.ledger.register(&username, &password, &agency) {
            Ok(_) => writeln!(self.output, "Account registered successfully!")?,
            Err(e) => self.render_error(&e)?,
        }
        Ok(true)
    }

    fn login(&mut self) -> Result<bool> {
        let Some(username) = self.prompt("Enter username: ")? else {
            return Ok(false);
        };
        let Some(password) = self.prompt_secret("Enter password: ")? else {
            return Ok(false);
        };

        let account = match self.ledger.login(&username, &password) {
            Ok(account) => account,
            Err(e) => {
                self.render_error(&e)?;
                return Ok(true);
            }
        };
        writeln!(self.output, "Welcome, {username}!")?;

        loop {
            match self.account_menu(&account)? {
                Session::Continue => {}
                Session::Logout => return Ok(true),
                Session::Quit => return Ok(false),
            }
        }
    }

    fn account_menu(&mut self, account: &AccountHandle) -> Result<Session> {
        writeln!(self.output, "--- Account Menu ---")?;
        writeln!(self.output, "1. Deposit")?;
        writeln!(self.output, "2. Withdraw")?;
        writeln!(self.output, "3. PIX Transfer")?;
        writeln!(self.output, "4. Show Account Info")?;
        writeln!(self.output, "5. View Transactions")?;
        writeln!(self.output, "6. Set/Update PIX Key")?;
        writeln!(self.output, "7. Change Credit Limit")?;
        writeln!(self.output, "8. Change Password")?;
        writeln!(self.output, "9. Export Statement (CSV)")?;
        writeln!(self.output, "0. Logout")?;

        let Some(choice) = self.prompt("Choose option: ")? else {
            return Ok(Session::Quit);
        };
        match choice.as_str() {
            "1" => {
                let Some(amount) = self.prompt_amount("Deposit amount: ")? else {
                    return Ok(Session::Quit);
                };
                match self.ledger.deposit(account, amount) {
                    Ok(info) => writeln!(
                        self.output,
                        "Deposited {amount}. New balance: {}",
                        info.balance
                    )?,
                    Err(e) => self.render_error(&e)?,
                }
            }
            "2" => {
                let Some(amount) = self.prompt_amount("Withdraw amount: ")? else {
                    return Ok(Session::Quit);
                };
                match self.ledger.withdraw(account, amount) {
                    Ok(info) => writeln!(
                        self.output,
                        "Withdrew {amount}. New balance: {}",
                        info.balance
                    )?,
                    Err(e) => self.render_error(&e)?,
                }
            }
            "3" => {
                let Some(key) = self.prompt("Target PIX key: ")? else {
                    return Ok(Session::Quit);
                };
                let Some(amount) = self.prompt_amount("Transfer amount: ")? else {
                    return Ok(Session::Quit);
                };
                match self.ledger.transfer(account, amount, &key) {
                    Ok(TransferOutcome::CreditDrawn { amount, .. }) => {
                        writeln!(self.output, "Added {amount} to balance using credit.")?
                    }
                    Ok(TransferOutcome::Sent {
                        amount, recipient, ..
                    }) => writeln!(self.output, "Transferred {amount} to {recipient}.")?,
                    Err(e) => self.render_error(&e)?,
                }
            }
            "4" => {
                let info = self.ledger.account_info(account)?;
                writeln!(self.output, "Username: {}", info.username)?;
                writeln!(self.output, "Agency: {}", info.agency)?;
                writeln!(self.output, "Balance: {}", info.balance)?;
                writeln!(
                    self.output,
                    "Credit Used: {} / {}",
                    info.credit_used, info.credit_limit
                )?;
                let key = if info.pix_key.is_empty() {
                    "Not set"
                } else {
                    info.pix_key.as_str()
                };
                writeln!(self.output, "PIX Key: {key}")?;
            }
            "5" => {
                writeln!(self.output, "--- Transaction Log ---")?;
                let transactions = self.ledger.transactions(account)?;
                if transactions.is_empty() {
                    writeln!(self.output, "<no transactions>")?;
                }
                for tx in transactions {
                    writeln!(self.output, "{tx}")?;
                }
            }
            "6" => {
                let Some(key) = self.prompt("Enter new PIX key: ")? else {
                    return Ok(Session::Quit);
                };
                match self.ledger.set_alias(account, &key) {
                    Ok(_) => writeln!(self.output, "PIX key updated successfully.")?,
                    Err(e) => self.render_error(&e)?,
                }
            }
            "7" => {
                let Some(limit) = self.prompt_amount("New credit limit: ")? else {
                    return Ok(Session::Quit);
                };
                match self.ledger.change_credit_limit(account, limit) {
                    Ok(info) => {
                        writeln!(self.output, "Credit limit updated to {}", info.credit_limit)?
                    }
                    Err(e) => self.render_error(&e)?,
                }
            }
            "8" => {
                let Some(old) = self.prompt_secret("Enter current password: ")? else {
                    return Ok(Session::Quit);
                };
                let Some(new) = self.prompt_secret("Enter new password: ")? else {
                    return Ok(Session::Quit);
                };
                match self.ledger.change_password(account, &old, &new) {
                    Ok(_) => writeln!(self.output, "Password updated successfully.")?,
                    Err(e) => self.render_error(&e)?,
                }
            }
            "9" => self.ledger.write_statement(account, &mut self.output)?,
            "0" => {
                writeln!(self.output, "Logged out.")?;
                return Ok(Session::Logout);
            }
            _ => writeln!(self.output, "Invalid option.")?,
        }
        Ok(Session::Continue)
    }

    fn render_error(&mut self, error: &LedgerError) -> Result<()> {
        if matches!(error, LedgerError::Poisoned) {
            log::error!("Ledger state is unusable: {error}");
        }
        writeln!(self.output, "{error}.")?;
        Ok(())
    }

    /// Prints `label` and reads one trimmed line. `None` at end of input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        Ok(self.read_line(label)?.map(|line| line.trim().to_owned()))
    }

    /// Like [`prompt`](Self::prompt) but only drops the line terminator,
    /// so surrounding spaces stay part of the password.
    fn prompt_secret(&mut self, label: &str) -> Result<Option<String>> {
        Ok(self
            .read_line(label)?
            .map(|line| line.trim_end_matches(['\r', '\n']).to_owned()))
    }

    fn read_line(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Re-prompts until the line parses as an amount.
    fn prompt_amount(&mut self, label: &str) -> Result<Option<Amount>> {
        loop {
            let Some(line) = self.prompt(label)? else {
                return Ok(None);
            };
            match Amount::from_str(&line) {
                Ok(amount) => return Ok(Some(amount)),
                Err(e) => {
                    log::debug!("Rejected numeric input {line:?}: {e}");
                    writeln!(self.output, "Invalid number.")?;
                }
            }
        }
    }
}
