use crate::quote::{run_check, run_quote, CheckArgs, QuoteArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use shoe_rental::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Bowling Shoes Rental",
    about = "Serve and inspect shoe rental discount decisions",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate discounts for a single customer from the command line
    Discount {
        #[command(subcommand)]
        command: DiscountCommand,
    },
}

#[derive(Subcommand, Debug)]
enum DiscountCommand {
    /// Print the discount decision and, optionally, the discounted rental fee
    Quote(QuoteArgs),
    /// Compare the model decision against the rule catalog
    Check(CheckArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Discount {
            command: DiscountCommand::Quote(args),
        } => run_quote(args).await,
        Command::Discount {
            command: DiscountCommand::Check(args),
        } => run_check(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::try_parse_from(["shoe-rental-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_quote_with_repeated_conditions() {
        let cli = Cli::try_parse_from([
            "shoe-rental-api",
            "discount",
            "quote",
            "--age",
            "70",
            "--condition",
            "diabetes",
            "--condition",
            "Hypertension",
            "--rental-fee",
            "6.5",
            "--rules-only",
        ])
        .expect("parses");

        let Some(Command::Discount {
            command: DiscountCommand::Quote(args),
        }) = cli.command
        else {
            panic!("expected quote command");
        };
        assert_eq!(args.customer.age, 70);
        assert!(!args.customer.disabled);
        assert_eq!(args.customer.conditions, vec!["diabetes", "Hypertension"]);
        assert_eq!(args.rental_fee, Some(6.5));
        assert!(args.rules_only);
    }

    #[test]
    fn check_requires_age() {
        assert!(Cli::try_parse_from(["shoe-rental-api", "discount", "check"]).is_err());
    }
}
