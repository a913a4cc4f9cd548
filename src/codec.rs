use crate::{error::DecodeError, store::quiz::Quiz};

pub fn encode(quiz: &Quiz) -> String {
    // Serializing plain strings and integers can't fail.
    let json = serde_json::to_string(quiz).unwrap_or_default();
    urlencoding::encode(&json).into_owned()
}

pub fn decode(token: &str) -> Result<Quiz, DecodeError> {
    let json = urlencoding::decode(token)?;
    let quiz: Quiz = serde_json::from_str(&json)?;
    quiz.check().map_err(DecodeError::Incomplete)?;
    Ok(quiz)
}

pub fn is_token(payload: &str) -> bool {
    payload.starts_with('{') || payload.to_ascii_uppercase().starts_with("%7B")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::quiz::Question;

    fn sample() -> Quiz {
        Quiz::retreive(
            "1729000000000".into(),
            "Soirée d'anniversaire & co / 100%".into(),
            vec![
                Question::new(
                    "Quel âge ?".into(),
                    vec!["29".into(), "30 ans #1".into(), "\"31\"".into()],
                    1,
                ),
                Question::new("Emoji 🎉?".into(), vec!["oui".into(), "non".into()], 0),
            ],
        )
    }

    #[test]
    fn decode_inverts_encode() {
        let quiz = sample();
        assert_eq!(decode(&encode(&quiz)).unwrap(), quiz);
    }

    #[test]
    fn token_is_url_safe() {
        let token = encode(&sample());
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.~%".contains(c)));
        assert!(is_token(&token));
    }

    #[test]
    fn accepts_unencoded_json() {
        let raw = r#"{"id":"1","title":"T","questions":[{"question":"Q","options":["a","b"],"answerIndex":0}]}"#;
        assert_eq!(decode(raw).unwrap().title(), "T");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(decode("%7Bnope"), Err(DecodeError::Json(_))));
        assert!(matches!(decode("%FF%FE"), Err(DecodeError::Encoding(_))));
        assert!(matches!(
            decode("%7B%22id%22%3A1%7D"),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn rejects_unplayable_quiz() {
        let raw = r#"{"id":"1","title":"T","questions":[{"question":"Q","options":["a"],"answerIndex":3}]}"#;
        assert!(matches!(decode(raw), Err(DecodeError::Incomplete(_))));
    }

    #[test]
    fn ids_are_not_tokens() {
        assert!(!is_token("1729000000000"));
        assert!(!is_token("3f2a9c"));
    }
}
