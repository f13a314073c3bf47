use crate::alphabet::Language;

/// The correct answers for a sheet, one symbol per question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerKey(Vec<char>);

impl AnswerKey {
    /// Builds a key from caller input, normalizing letters to uppercase.
    pub fn new(answers: &str) -> Self {
        Self(answers.trim().chars().flat_map(char::to_uppercase).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn symbols(&self) -> &[char] {
        &self.0
    }

    /// Lists the 1-based positions and symbols of the key that no bubble
    /// of a question with `options_per_question` options could produce.
    pub fn invalid_symbols(
        &self,
        language: Language,
        options_per_question: usize,
    ) -> Vec<(usize, char)> {
        let symbols = language.symbols();
        let allowed = &symbols[..options_per_question.min(symbols.len())];
        self.0
            .iter()
            .enumerate()
            .filter(|(_, symbol)| !allowed.contains(*symbol))
            .map(|(i, symbol)| (i + 1, *symbol))
            .collect()
    }
}

/// How a detected answer string compares with an answer key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    pub total_questions: usize,
    pub correct_count: usize,
    pub incorrect_questions: Vec<usize>,
}

/// Compares detected answers against the key position by position.
///
/// `total_questions` is always the key length, but only the first
/// `min(key, detected)` positions are compared: questions past the end of
/// the shorter sequence are neither correct nor incorrect.
pub fn score_answers(detected_answers: &str, key: &AnswerKey) -> Score {
    let mut correct_count = 0;
    let mut incorrect_questions = vec![];
    for (i, (expected, detected)) in key.symbols().iter().zip(detected_answers.chars()).enumerate()
    {
        if *expected == detected {
            correct_count += 1;
        } else {
            incorrect_questions.push(i + 1);
        }
    }

    Score {
        total_questions: key.len(),
        correct_count,
        incorrect_questions,
    }
}
