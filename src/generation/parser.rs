//! Parser for free-form question replies.
//!
//! Grammar, applied line by line:
//!
//! ```text
//! reply     = block *(blank-line+ block)
//! block     = line+                    ; kept only with a question, option and correct line
//! question  = line containing "question"             -> text after the first ':'
//! option    = DIGIT+ "." text | "option" word "." text
//! correct   = line containing "correct" (or starting with "answer") -> trailing integer, 1-based
//! difficulty= line containing "difficulty"           -> beginner | intermediate | advanced
//! ```
//!
//! Blocks with fewer than two options are dropped. An out-of-range or missing
//! correct number selects the first option. An unknown difficulty is `intermediate`.

use crate::exercise::{Difficulty, Question};

pub fn parse_questions(reply: &str) -> Vec<Question> {
    split_blocks(reply)
        .iter()
        .filter_map(|block| parse_block(block))
        .collect()
}

fn split_blocks(reply: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in reply.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

/// Option text if `line` is an enumerated option.
fn option_text(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    let rest = if digits > 0 {
        trimmed[digits..].strip_prefix('.')?
    } else if trimmed
        .get(..6)
        .map_or(false, |p| p.eq_ignore_ascii_case("option"))
    {
        let (_, after) = trimmed.split_once('.')?;
        after
    } else {
        return None;
    };
    let text = rest.trim();
    (!text.is_empty()).then_some(text)
}

fn is_correct_line(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    (lower.contains("correct") || lower.starts_with("answer")) && option_text(line).is_none()
}

fn trailing_integer(line: &str) -> Option<usize> {
    let trimmed = line.trim_end_matches(|c: char| !c.is_ascii_digit());
    let start = trimmed
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    trimmed[start..].parse().ok()
}

/// Text after the first ':' (or the whole line without one), if non-empty.
fn question_text(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let text = trimmed
        .split_once(':')
        .map(|(_, rest)| rest)
        .unwrap_or(trimmed)
        .trim();
    (!text.is_empty()).then_some(text)
}

/// `Question ...` with an optional `1.` / `1)` enumeration in front.
fn starts_with_marker(line: &str) -> bool {
    let rest = line
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start_matches(['.', ')'])
        .trim_start();
    rest.get(..8)
        .map_or(false, |p| p.eq_ignore_ascii_case("question"))
}

/// Line carrying the question. A line that starts with the marker wins over
/// one that only mentions it, and lines with nothing after the colon are skipped.
fn question_line(lines: &[&str]) -> Option<usize> {
    let candidates: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.to_lowercase().contains("question") && question_text(l).is_some())
        .map(|(i, _)| i)
        .collect();
    candidates
        .iter()
        .copied()
        .find(|&i| starts_with_marker(lines[i]))
        .or_else(|| candidates.first().copied())
}

fn parse_block(lines: &[&str]) -> Option<Question> {
    let question_idx = question_line(lines)?;
    let correct_idx = lines
        .iter()
        .enumerate()
        .position(|(i, l)| i != question_idx && is_correct_line(l))?;
    let difficulty_idx = lines.iter().enumerate().position(|(i, l)| {
        i != question_idx
            && i != correct_idx
            && l.to_lowercase().contains("difficulty")
            && option_text(l).is_none()
    });

    let options: Vec<String> = lines
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != question_idx && *i != correct_idx && Some(*i) != difficulty_idx)
        .filter_map(|(_, l)| option_text(l))
        .map(str::to_string)
        .collect();
    if options.len() < 2 {
        return None;
    }

    let text = question_text(lines[question_idx])?;

    let correct_option_index = trailing_integer(lines[correct_idx])
        .filter(|n| (1..=options.len()).contains(n))
        .map(|n| n - 1)
        .unwrap_or(0);

    let difficulty = difficulty_idx
        .and_then(|i| Difficulty::find_in(lines[i]))
        .unwrap_or_default();

    Some(Question::new(text, options, correct_option_index, difficulty))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Case {
        name: &'static str,
        reply: &'static str,
        /// (text, options, correct, difficulty) per parsed question
        expected: &'static [(&'static str, &'static [&'static str], usize, Difficulty)],
    }

    const CASES: &[Case] = &[
        Case {
            name: "well formed three blocks",
            reply: "Question: Where is the speaker?\n1. At home\n2. At work\n3. In a café\n4. On a train\nCorrect answer: 3\nDifficulty: beginner\n\n\
                    Question: What time is it?\n1. Noon\n2. Midnight\n3. Dawn\n4. Dusk\nCorrect answer: 1\nDifficulty: advanced\n\n\
                    Question: Who answers?\n1. A waiter\n2. A friend\n3. A child\n4. Nobody\nCorrect answer: 4\nDifficulty: intermediate",
            expected: &[
                ("Where is the speaker?", &["At home", "At work", "In a café", "On a train"], 2, Difficulty::Beginner),
                ("What time is it?", &["Noon", "Midnight", "Dawn", "Dusk"], 0, Difficulty::Advanced),
                ("Who answers?", &["A waiter", "A friend", "A child", "Nobody"], 3, Difficulty::Intermediate),
            ],
        },
        Case {
            name: "crlf line endings and extra blank lines",
            reply: "\r\n\r\nQuestion: Qui parle ?\r\n1. Marie\r\n2. Paul\r\nCorrect answer: 2\r\nDifficulty: Beginner\r\n\r\n\r\n",
            expected: &[("Qui parle ?", &["Marie", "Paul"], 1, Difficulty::Beginner)],
        },
        Case {
            name: "block without correct marker is dropped",
            reply: "Question: Missing answer?\n1. Yes\n2. No\nDifficulty: beginner\n\n\
                    Question: Kept?\n1. Yes\n2. No\nCorrect answer: 1",
            expected: &[("Kept?", &["Yes", "No"], 0, Difficulty::Intermediate)],
        },
        Case {
            name: "block with a single option is dropped",
            reply: "Question: Only one?\n1. Lonely\nCorrect answer: 1\nDifficulty: beginner",
            expected: &[],
        },
        Case {
            name: "block without question marker is dropped",
            reply: "Which one?\n1. A\n2. B\nCorrect answer: 1",
            expected: &[],
        },
        Case {
            name: "explicit option markers",
            reply: "Question: Colour?\nOption A. Red\nOption B. Blue\noption 3. Green\nCorrect answer: 2\nDifficulty: advanced",
            expected: &[("Colour?", &["Red", "Blue", "Green"], 1, Difficulty::Advanced)],
        },
        Case {
            name: "text keeps everything after the first colon",
            reply: "Question 2: At 10:30, what happens?\n1. Lunch\n2. A meeting\nCorrect answer: 2",
            expected: &[("At 10:30, what happens?", &["Lunch", "A meeting"], 1, Difficulty::Intermediate)],
        },
        Case {
            name: "out of range and zero correct numbers select the first option",
            reply: "Question: Too high?\n1. A\n2. B\nCorrect answer: 7\n\n\
                    Question: Zero?\n1. A\n2. B\nCorrect answer: 0\n\n\
                    Question: None?\n1. A\n2. B\nCorrect answer: unknown",
            expected: &[
                ("Too high?", &["A", "B"], 0, Difficulty::Intermediate),
                ("Zero?", &["A", "B"], 0, Difficulty::Intermediate),
                ("None?", &["A", "B"], 0, Difficulty::Intermediate),
            ],
        },
        Case {
            name: "trailing punctuation after the correct number",
            reply: "Question: Punctuated?\n1. A\n2. B\n3. C\nCorrect answer: 3.\nDifficulty: hard",
            expected: &[("Punctuated?", &["A", "B", "C"], 2, Difficulty::Intermediate)],
        },
        Case {
            name: "option mentioning correct is still an option",
            reply: "Question: Which is right?\n1. The correct time\n2. The wrong time\nCorrect answer: 1\nDifficulty: beginner",
            expected: &[("Which is right?", &["The correct time", "The wrong time"], 0, Difficulty::Beginner)],
        },
        Case {
            name: "numbered question line is not an option",
            reply: "1. Question: Numbered?\n1. Yes\n2. No\nAnswer: 2",
            expected: &[("Numbered?", &["Yes", "No"], 1, Difficulty::Intermediate)],
        },
        Case {
            name: "empty options and prose lines are ignored",
            reply: "Question: Sparse?\n1.\n2. Real\nSome commentary here\n3. Also real\nCorrect answer: 2",
            expected: &[("Sparse?", &["Real", "Also real"], 1, Difficulty::Intermediate)],
        },
        Case {
            name: "preamble above the first block is not the question",
            reply: "Here are three questions:\nQuestion: Où est Marie ?\n1. À Paris\n2. À Lyon\n3. À Nice\nCorrect answer: 2",
            expected: &[("Où est Marie ?", &["À Paris", "À Lyon", "À Nice"], 1, Difficulty::Intermediate)],
        },
        Case {
            name: "question line with nothing after the colon is dropped",
            reply: "Question:\n1. A\n2. B\nCorrect answer: 1",
            expected: &[],
        },
        Case {
            name: "prose reply yields nothing",
            reply: "I would recommend exercises about travel, food, and weather.",
            expected: &[],
        },
        Case {
            name: "empty reply yields nothing",
            reply: "",
            expected: &[],
        },
    ];

    #[test]
    fn parser_table() {
        for case in CASES {
            let parsed = parse_questions(case.reply);
            assert_eq!(parsed.len(), case.expected.len(), "{}: {:?}", case.name, parsed);
            for (q, (text, options, correct, difficulty)) in parsed.iter().zip(case.expected) {
                assert_eq!(q.text, *text, "{}", case.name);
                assert_eq!(q.options, *options, "{}", case.name);
                assert_eq!(q.correct_option_index, *correct, "{}", case.name);
                assert_eq!(q.difficulty, *difficulty, "{}", case.name);
                assert!(q.is_well_formed(), "{}", case.name);
                assert_eq!(q.user_selected, None);
            }
        }
    }

    #[test]
    fn trailing_integer_reads_last_number() {
        assert_eq!(trailing_integer("Correct answer: 12"), Some(12));
        assert_eq!(trailing_integer("Correct answer: 2 (Paris)"), Some(2));
        assert_eq!(trailing_integer("Correct answer: two"), None);
    }
}
