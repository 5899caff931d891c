//! Interactive menu controller.
//!
//! A role-gated loop over three menu states: logged out, librarian session,
//! and member session. Domain failures are printed and return to the menu;
//! storage and I/O faults propagate and terminate.

use std::path::PathBuf;

mod terminal;

use biblio::{Library, Loan, Session, Store, service};
use chrono::NaiveDate;
use clap::ArgAction;
use dialoguer::{Input, Password, Select};
use terminal::Colorize;
use tracing::instrument;

/// Single-user library manager over flat CSV files.
#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// The directory holding the record files
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,
}

impl Cli {
    /// Run the interactive session until the user exits.
    ///
    /// # Errors
    ///
    /// Returns an error if the record files or the terminal cannot be read
    /// or written.
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let library = Library::new(Store::new(self.data_dir));
        main_menu(&library)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[instrument(skip(library))]
fn main_menu(library: &Library) -> anyhow::Result<()> {
    println!("Welcome to the library.");
    loop {
        match choose("Menu", &["Log in", "Exit"])? {
            0 => {
                if let Some(session) = login(library)? {
                    match session {
                        Session::Librarian => librarian_menu(library)?,
                        Session::Member { id, name } => member_menu(library, &id, &name)?,
                    }
                }
            }
            _ => return Ok(()),
        }
    }
}

/// Authenticate as either role, or `None` if the attempt was rejected.
fn login(library: &Library) -> anyhow::Result<Option<Session>> {
    let result = match choose("Log in as", &["Librarian", "Member"])? {
        0 => {
            let username = prompt("Username")?;
            let password = prompt_password("Password")?;
            service::authenticate_librarian(&username, &password)
        }
        _ => {
            let id = prompt("Member ID")?;
            let password = prompt_password("Password")?;
            library.authenticate_member(&id, &password)
        }
    };

    match result {
        Ok(session) => {
            if let Session::Member { name, .. } = &session {
                println!("{}", format!("Welcome, {name}.").success());
            }
            Ok(Some(session))
        }
        Err(err) if err.is_recoverable() => {
            println!("{}", err.to_string().warning());
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn librarian_menu(library: &Library) -> anyhow::Result<()> {
    loop {
        let choice = choose(
            "Librarian",
            &[
                "Add book",
                "Remove book",
                "Register member",
                "Issue book",
                "Return book",
                "Overdue report",
                "Search catalogue",
                "Log out",
            ],
        )?;
        match choice {
            0 => add_book(library)?,
            1 => remove_book(library)?,
            2 => register_member(library)?,
            3 => issue_book(library)?,
            4 => return_book(library)?,
            5 => overdue_report(library)?,
            6 => search_catalogue(library)?,
            _ => return Ok(()),
        }
    }
}

fn member_menu(library: &Library, member_id: &str, name: &str) -> anyhow::Result<()> {
    loop {
        let choice = choose(
            name,
            &["Search catalogue", "Borrow book", "My loans", "Log out"],
        )?;
        match choice {
            0 => search_catalogue(library)?,
            1 => borrow_book(library, member_id)?,
            2 => my_loans(library, member_id)?,
            _ => return Ok(()),
        }
    }
}

fn add_book(library: &Library) -> anyhow::Result<()> {
    let isbn = prompt("ISBN")?;
    let title = prompt("Title")?;
    let author = prompt("Author")?;
    let copies = match service::parse_copies(&prompt("Total copies")?) {
        Ok(copies) => copies,
        Err(err) => {
            println!("{}", err.to_string().warning());
            return Ok(());
        }
    };

    report(library.add_book(&isbn, &title, &author, copies).map(|book| {
        println!(
            "{}",
            format!("Added {:?} ({} copies).", book.title, book.copies_total).success()
        );
    }))
}

fn remove_book(library: &Library) -> anyhow::Result<()> {
    let isbn = prompt("ISBN to remove")?;
    report(
        library
            .remove_book(&isbn)
            .map(|()| println!("{}", "Removed.".success())),
    )
}

fn register_member(library: &Library) -> anyhow::Result<()> {
    let id = prompt("Member ID")?;
    let name = prompt("Name")?;
    let email = prompt("Email")?;
    let password = prompt_password("Password")?;
    let confirm = prompt_password("Confirm password")?;

    report(
        library
            .register_member(&id, &name, &email, &password, &confirm)
            .map(|member| println!("{}", format!("Registered member {}.", member.id).success())),
    )
}

fn issue_book(library: &Library) -> anyhow::Result<()> {
    let isbn = prompt("ISBN to issue")?;
    let member_id = prompt("Member ID")?;
    report(library.issue_loan(&isbn, &member_id).map(|loan| {
        println!(
            "{}",
            format!("Issued. Due on {}.", pretty_date(loan.due_date)).success()
        );
    }))
}

fn borrow_book(library: &Library, member_id: &str) -> anyhow::Result<()> {
    let isbn = prompt("ISBN to borrow")?;
    report(library.issue_loan(&isbn, member_id).map(|loan| {
        println!(
            "{}",
            format!("Borrowed. Due on {}.", pretty_date(loan.due_date)).success()
        );
    }))
}

fn return_book(library: &Library) -> anyhow::Result<()> {
    let identifier = prompt("Loan ID (or \"member-id isbn\")")?;
    report(
        library
            .return_loan(&identifier)
            .map(|loan| println!("{}", format!("Return recorded for loan {}.", loan.id).success())),
    )
}

fn overdue_report(library: &Library) -> anyhow::Result<()> {
    let overdue = library.overdue_loans()?;
    if overdue.is_empty() {
        println!("No overdue loans.");
        return Ok(());
    }

    println!("Overdue:");
    for loan in overdue {
        println!(
            "  {} | member {} | ISBN {} | due {}",
            loan.id,
            loan.member_id,
            loan.isbn,
            pretty_date(loan.due_date).warning()
        );
    }
    Ok(())
}

fn search_catalogue(library: &Library) -> anyhow::Result<()> {
    let keyword = prompt_allow_empty("Title/author keyword")?;
    let hits = library.search_catalog(&keyword)?;
    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for book in hits {
        println!(
            "  {} | {} | {} | {}",
            book.isbn,
            book.title,
            book.author,
            format!("{}/{}", book.copies_available, book.copies_total).dim()
        );
    }
    Ok(())
}

fn my_loans(library: &Library, member_id: &str) -> anyhow::Result<()> {
    let loans = library.loans_for(member_id)?;
    if loans.is_empty() {
        println!("No loans.");
        return Ok(());
    }

    for loan in loans {
        println!(
            "  {} | ISBN {} | issued {} | {}",
            loan.id,
            loan.isbn,
            pretty_date(loan.issue_date),
            loan_status(&loan)
        );
    }
    Ok(())
}

fn loan_status(loan: &Loan) -> String {
    loan.return_date.map_or_else(
        || format!("due {}", pretty_date(loan.due_date)),
        |date| format!("returned {}", pretty_date(date)).dim(),
    )
}

fn pretty_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

/// Print a recoverable domain failure; propagate anything environmental.
fn report(result: Result<(), service::Error>) -> anyhow::Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err) if err.is_recoverable() => {
            println!("{}", err.to_string().warning());
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn choose(label: &str, items: &[&str]) -> anyhow::Result<usize> {
    Ok(Select::new()
        .with_prompt(label)
        .items(items)
        .default(0)
        .interact()?)
}

fn prompt(label: &str) -> anyhow::Result<String> {
    let input: String = Input::new().with_prompt(label).interact_text()?;
    Ok(input.trim().to_string())
}

fn prompt_allow_empty(label: &str) -> anyhow::Result<String> {
    let input: String = Input::new()
        .with_prompt(label)
        .allow_empty(true)
        .interact_text()?;
    Ok(input.trim().to_string())
}

fn prompt_password(label: &str) -> anyhow::Result<String> {
    Ok(Password::new()
        .with_prompt(label)
        .allow_empty_password(true)
        .interact()?)
}
