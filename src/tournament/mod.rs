/// The announcement posted by `create_tournament` and the form that feeds it.
pub mod announcement;
/// The `newtournament` argument parser and the post it produces.
pub mod post;

use strum::{Display, EnumIter, IntoEnumIterator};

/// Team format of a tournament.
#[derive(
    Debug,
    Default,
    PartialEq,
    Eq,
    Clone,
    Copy,
    Display,
    poise::ChoiceParameter,
    EnumIter,
)]
pub enum Format {
    #[default]
    #[name = "1v1"]
    #[strum(to_string = "1v1")]
    OneVsOne,
    #[name = "2v2"]
    #[strum(to_string = "2v2")]
    TwoVsTwo,
    #[name = "3v3"]
    #[strum(to_string = "3v3")]
    ThreeVsThree,
    #[name = "4v4"]
    #[strum(to_string = "4v4")]
    FourVsFour,
    #[name = "5v5"]
    #[strum(to_string = "5v5")]
    FiveVsFive,
}

impl Format {
    /// Looks a format up by its exact token, e.g. `2v2`.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::iter().find(|format| format.to_string() == token)
    }

    /// Comma separated list of every accepted token.
    pub fn tokens() -> String {
        Self::iter()
            .map(|format| format.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn team_size(self) -> u8 {
        match self {
            Self::OneVsOne => 1,
            Self::TwoVsTwo => 2,
            Self::ThreeVsThree => 3,
            Self::FourVsFour => 4,
            Self::FiveVsFive => 5,
        }
    }

    #[inline]
    pub fn is_team(self) -> bool {
        self.team_size() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_through_display() {
        for format in Format::iter() {
            assert_eq!(Format::from_token(&format.to_string()), Some(format));
        }
        assert_eq!(Format::tokens(), "1v1, 2v2, 3v3, 4v4, 5v5");
    }

    #[test]
    fn unknown_tokens_are_not_formats() {
        for token in ["6v6", "2V2", " 2v2", "2v3", ""] {
            assert_eq!(Format::from_token(token), None, "{token:?}");
        }
    }

    #[test]
    fn only_solo_is_not_a_team_format() {
        assert!(!Format::OneVsOne.is_team());
        assert!(Format::iter().skip(1).all(Format::is_team));
        assert_eq!(Format::FiveVsFive.team_size(), 5);
    }
}
