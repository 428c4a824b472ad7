// src/cli/output.rs — Final result rendering (stdout)

use crate::core::types::Bracket;
use crate::util::capitalize;

/// "The Ultimate {Theme} is: {champion}"
pub fn champion_line(bracket: &Bracket) -> String {
    format!(
        "The Ultimate {} is: {}",
        capitalize(&bracket.theme),
        bracket.champion
    )
}

pub fn bracket_json(bracket: &Bracket) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(bracket)?)
}

/// Print the result: the whole bracket as JSON, or the champion line.
pub fn print_result(bracket: &Bracket, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", bracket_json(bracket)?);
    } else {
        println!();
        println!("{}", champion_line(bracket));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{MatchRecord, RoundRecord};

    fn bracket() -> Bracket {
        Bracket {
            theme: "sci-fi movies".into(),
            seeding: vec!["Alien".into(), "Solaris".into()],
            rounds: vec![RoundRecord {
                number: 1,
                entrants: vec!["Alien".into(), "Solaris".into()],
                matches: vec![MatchRecord {
                    left: "Alien".into(),
                    right: "Solaris".into(),
                    winner: "Solaris".into(),
                }],
                bye: None,
            }],
            champion: "Solaris".into(),
        }
    }

    #[test]
    fn test_champion_line() {
        assert_eq!(
            champion_line(&bracket()),
            "The Ultimate Sci-fi movies is: Solaris"
        );
    }

    #[test]
    fn test_bracket_json_shape() {
        let value: serde_json::Value =
            serde_json::from_str(&bracket_json(&bracket()).unwrap()).unwrap();
        assert_eq!(value["champion"], "Solaris");
        assert_eq!(value["rounds"][0]["matches"][0]["winner"], "Solaris");
        assert!(value["rounds"][0]["bye"].is_null());
    }
}
