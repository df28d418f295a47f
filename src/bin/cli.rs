//! Barkeep CLI Client
//!
//! Command-line interface for a running barkeep-server.

use std::process::ExitCode;

use barkeep::network::Client;
use barkeep::protocol::{Command, Response};
use barkeep::{Cocktail, Ingredient};
use clap::{Parser, Subcommand};

/// Barkeep CLI
#[derive(Parser, Debug)]
#[command(name = "barkeep-cli")]
#[command(about = "CLI for the barkeep catalog server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server
    Ping,

    /// Add an ingredient (fails if the id exists)
    AddIngredient {
        id: String,
        name: String,
        #[arg(long, default_value = "")]
        en_name: String,
        #[arg(long, default_value_t = 0)]
        abv: i32,
    },

    /// Replace (or insert) an ingredient
    SetIngredient {
        id: String,
        name: String,
        #[arg(long, default_value = "")]
        en_name: String,
        #[arg(long, default_value_t = 0)]
        abv: i32,
    },

    /// Show one ingredient
    Ingredient { id: String },

    /// List all ingredients
    Ingredients,

    /// Ingredients whose name contains QUERY
    FindIngredients { query: String },

    /// Add a cocktail (fails if the id exists)
    AddCocktail {
        id: String,
        name: String,
        #[arg(long, default_value = "")]
        en_name: String,
        /// Ingredient id; repeat for several
        #[arg(short, long = "ingredient")]
        ingredients: Vec<String>,
    },

    /// Replace (or insert) a cocktail
    SetCocktail {
        id: String,
        name: String,
        #[arg(long, default_value = "")]
        en_name: String,
        #[arg(short, long = "ingredient")]
        ingredients: Vec<String>,
    },

    /// Show one cocktail
    Cocktail { id: String },

    /// List all cocktails
    Cocktails,

    /// Cocktails whose name contains QUERY
    FindCocktails { query: String },

    /// Ingredients and cocktails whose name contains QUERY
    Search { query: String },
}

impl Commands {
    fn into_command(self) -> Command {
        match self {
            Commands::Ping => Command::Ping,
            Commands::AddIngredient { id, name, en_name, abv } => {
                Command::CreateIngredient(Ingredient::new(id, name, en_name, abv))
            }
            Commands::SetIngredient { id, name, en_name, abv } => {
                Command::UpdateIngredient(Ingredient::new(id, name, en_name, abv))
            }
            Commands::Ingredient { id } => Command::GetIngredient { id },
            Commands::Ingredients => Command::ListIngredients,
            Commands::FindIngredients { query } => Command::FindIngredients { query },
            Commands::AddCocktail { id, name, en_name, ingredients } => {
                Command::CreateCocktail(cocktail(id, name, en_name, ingredients))
            }
            Commands::SetCocktail { id, name, en_name, ingredients } => {
                Command::UpdateCocktail(cocktail(id, name, en_name, ingredients))
            }
            Commands::Cocktail { id } => Command::GetCocktail { id },
            Commands::Cocktails => Command::ListCocktails,
            Commands::FindCocktails { query } => Command::FindCocktails { query },
            Commands::Search { query } => Command::Search { query },
        }
    }
}

fn cocktail(id: String, name: String, en_name: String, ingredients: Vec<String>) -> Cocktail {
    ingredients
        .into_iter()
        .fold(Cocktail::new(id, name, en_name), |cocktail, ingredient| {
            cocktail.with_ingredient(ingredient)
        })
}

fn main() -> ExitCode {
    let args = Args::parse();
    let command = args.command.into_command();

    let response = Client::connect(&args.server).and_then(|mut client| client.send(&command));

    match response {
        Ok(response) => print_response(&response),
        Err(e) => {
            eprintln!("(error) {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_response(response: &Response) -> ExitCode {
    let body = response
        .decode_json::<serde_json::Value>()
        .and_then(|value| {
            serde_json::to_string_pretty(&value)
                .map_err(|e| barkeep::BarkeepError::Encode(e.to_string()))
        })
        .unwrap_or_else(|_| String::from_utf8_lossy(response.payload.as_deref().unwrap_or(&[])).into_owned());

    if response.status.is_success() {
        println!("{}", body);
        ExitCode::SUCCESS
    } else {
        eprintln!("({:?}) {}", response.status, body);
        ExitCode::FAILURE
    }
}
