use super::ui;
use crate::core::session::{SessionContext, SignupRequest, User};
use anyhow::{Context, Result};
use console::Term;

/// Reads a password from the terminal when it was not given as an argument.
pub fn password_or_prompt(password: Option<String>, prompt: &str) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    let term = Term::stderr();
    term.write_str(prompt)?;
    term.read_secure_line().context("Failed to read password")
}

fn print_user(user: &User) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Name"), ui::header_cell("Email")]);
    table.add_row(vec![user.name.as_str(), user.email.as_str()]);
    println!("{table}");
}

pub async fn login(session: &SessionContext, email: &str, password: &str) -> Result<()> {
    let user = session.login(email, password).await?;
    println!(
        "Logged in as {}",
        ui::style_text(&user.name, ui::StyleType::Value)
    );
    Ok(())
}

pub async fn signup(session: &SessionContext, request: &SignupRequest) -> Result<()> {
    let user = session.signup(request).await?;
    println!(
        "Account created. Welcome, {}!",
        ui::style_text(&user.name, ui::StyleType::Value)
    );
    Ok(())
}

pub async fn logout(session: &SessionContext) -> Result<()> {
    if !session.is_authenticated() {
        println!("You are not logged in.");
        return Ok(());
    }
    session.logout().await?;
    println!("Logged out.");
    Ok(())
}

pub fn account(session: &SessionContext) -> Result<()> {
    let user = session.require_user()?;
    println!("\n{}", ui::style_text("Account", ui::StyleType::Title));
    print_user(&user);
    Ok(())
}
