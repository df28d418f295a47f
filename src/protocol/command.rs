//! Command definitions
//!
//! Represents requests from clients.

use crate::catalog::{Cocktail, Ingredient};

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Ping = 0x01,

    CreateIngredient = 0x10,
    UpdateIngredient = 0x11,
    GetIngredient = 0x12,
    ListIngredients = 0x13,
    FindIngredients = 0x14,

    CreateCocktail = 0x20,
    UpdateCocktail = 0x21,
    GetCocktail = 0x22,
    ListCocktails = 0x23,
    FindCocktails = 0x24,

    Search = 0x30,
}

impl CommandType {
    /// Parse a wire byte
    pub fn from_u8(byte: u8) -> Option<Self> {
        let cmd_type = match byte {
            0x01 => CommandType::Ping,
            0x10 => CommandType::CreateIngredient,
            0x11 => CommandType::UpdateIngredient,
            0x12 => CommandType::GetIngredient,
            0x13 => CommandType::ListIngredients,
            0x14 => CommandType::FindIngredients,
            0x20 => CommandType::CreateCocktail,
            0x21 => CommandType::UpdateCocktail,
            0x22 => CommandType::GetCocktail,
            0x23 => CommandType::ListCocktails,
            0x24 => CommandType::FindCocktails,
            0x30 => CommandType::Search,
            _ => return None,
        };
        Some(cmd_type)
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Ping (health check)
    Ping,

    /// Add an ingredient; fails if the id exists
    CreateIngredient(Ingredient),

    /// Overwrite or insert an ingredient
    UpdateIngredient(Ingredient),

    /// Fetch one ingredient
    GetIngredient { id: String },

    /// Fetch every ingredient
    ListIngredients,

    /// Ingredients whose names contain `query`
    FindIngredients { query: String },

    /// Add a cocktail; fails if the id exists
    CreateCocktail(Cocktail),

    /// Overwrite or insert a cocktail
    UpdateCocktail(Cocktail),

    /// Fetch one cocktail
    GetCocktail { id: String },

    /// Fetch every cocktail
    ListCocktails,

    /// Cocktails whose names contain `query`
    FindCocktails { query: String },

    /// Ingredients and cocktails whose names contain `query`
    Search { query: String },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Ping => CommandType::Ping,
            Command::CreateIngredient(_) => CommandType::CreateIngredient,
            Command::UpdateIngredient(_) => CommandType::UpdateIngredient,
            Command::GetIngredient { .. } => CommandType::GetIngredient,
            Command::ListIngredients => CommandType::ListIngredients,
            Command::FindIngredients { .. } => CommandType::FindIngredients,
            Command::CreateCocktail(_) => CommandType::CreateCocktail,
            Command::UpdateCocktail(_) => CommandType::UpdateCocktail,
            Command::GetCocktail { .. } => CommandType::GetCocktail,
            Command::ListCocktails => CommandType::ListCocktails,
            Command::FindCocktails { .. } => CommandType::FindCocktails,
            Command::Search { .. } => CommandType::Search,
        }
    }
}
