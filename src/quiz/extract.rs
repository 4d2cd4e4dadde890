use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::quiz::{Label, OptionSet, QuestionRecord};

// Numbered stem, four lettered options, then a `**Correct Answer: X**` marker.
static BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\d+\.)\s*(.*?)\n\s*A\)\s*(.*?)\s*B\)\s*(.*?)\s*C\)\s*(.*?)\s*D\)\s*(.*?)\n\s*\*\*Correct Answer:\s*(.*?)\*\*",
    )
    .expect("block pattern is valid")
});

static QUESTION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[\s*_#]*(?:question\s*)?\d+\s*[.):][\s*_]*(.+?)[\s*_]*$")
        .expect("question pattern is valid")
});

static OPTION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:[-*]\s*)?\(?([a-d])[).:]\s*(.+?)\s*$").expect("option pattern is valid")
});

static ANSWER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[\s*_]*(?:correct\s+)?answer[\s*_]*[:\-][\s*_]*\(?([a-d])\b")
        .expect("answer pattern is valid")
});

/// Parses generated text into at most `max_questions` records, in document order.
///
/// Text that does not follow the expected block layout is skipped, so malformed
/// input yields fewer records (possibly none) rather than an error.
pub fn extract(raw_text: &str, max_questions: usize) -> Vec<QuestionRecord> {
    let records: Vec<QuestionRecord> = BLOCK
        .captures_iter(raw_text)
        .take(max_questions)
        .map(|caps| {
            let field = |i: usize| caps[i].trim().to_string();
            QuestionRecord::new(
                field(2),
                OptionSet::new(field(3), field(4), field(5), field(6)),
                Label::from_answer_token(&caps[7]),
            )
        })
        .collect();

    debug!("Strict pass extracted {} question(s)", records.len());
    records
}

/// Line-oriented parser accepting the usual variations of numbering, option
/// prefixes and answer markers. Only the letter of the answer marker is used.
pub fn extract_lenient(raw_text: &str, max_questions: usize) -> Vec<QuestionRecord> {
    let mut records = Vec::new();
    let mut block: Option<PendingBlock> = None;

    for line in raw_text.lines() {
        if records.len() >= max_questions {
            break;
        }

        if let Some(caps) = ANSWER_LINE.captures(line) {
            if let Some(pending) = block.take() {
                let label = Label::from_answer_token(&caps[1]);
                records.extend(pending.finish(label));
            }
            continue;
        }

        if let Some(caps) = OPTION_LINE.captures(line) {
            if let Some(pending) = block.as_mut() {
                let label = Label::from_answer_token(&caps[1]);
                pending.options[label as usize] = Some(caps[2].to_string());
                continue;
            }
        }

        if let Some(caps) = QUESTION_LINE.captures(line) {
            if let Some(pending) = block.take() {
                records.extend(pending.finish(Label::default()));
            }
            block = Some(PendingBlock::new(caps[1].to_string()));
        }
    }

    if let Some(pending) = block {
        records.extend(pending.finish(Label::default()));
    }
    records.truncate(max_questions);

    debug!("Lenient pass extracted {} question(s)", records.len());
    records
}

/// Strict pass first; the lenient pass only runs when it finds nothing.
pub fn extract_with_fallback(raw_text: &str, max_questions: usize) -> Vec<QuestionRecord> {
    let records = extract(raw_text, max_questions);
    if !records.is_empty() {
        return records;
    }
    extract_lenient(raw_text, max_questions)
}

struct PendingBlock {
    stem: String,
    options: [Option<String>; 4],
}

impl PendingBlock {
    fn new(stem: String) -> Self {
        Self {
            stem,
            options: Default::default(),
        }
    }

    // Blocks missing any option are dropped.
    fn finish(self, label: Label) -> Option<QuestionRecord> {
        let [Some(a), Some(b), Some(c), Some(d)] = self.options else {
            return None;
        };
        Some(QuestionRecord::new(
            self.stem,
            OptionSet::new(a, b, c, d),
            label,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = "1. What is 2+2?\nA) 3\nB) 4\nC) 5\nD) 6\n**Correct Answer: B**";

    const THREE: &str = "Sure! Here is your quiz:

1. What is the capital of France?
   A) Berlin
   B) Madrid
   C) Paris
   D) Rome
   **Correct Answer: C**

2. Which planet is known as the Red Planet?
   A) Mars
   B) Venus
   C) Jupiter
   D) Saturn
   **Correct Answer: A**

3. What is H2O commonly called?
   A) Salt
   B) Water
   C) Oxygen
   D) Hydrogen
   **Correct Answer: B**
";

    fn options(record: &QuestionRecord) -> Vec<&str> {
        record.options().iter().map(|(_, value)| value).collect()
    }

    #[test]
    fn extracts_single_block() {
        let records = extract(SINGLE, 10);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text(), "What is 2+2?");
        assert_eq!(options(&records[0]), vec!["3", "4", "5", "6"]);
        assert_eq!(records[0].correct_label(), Label::B);
    }

    #[test]
    fn keeps_document_order_and_trims_fields() {
        let records = extract(THREE, 10);

        let stems: Vec<&str> = records.iter().map(|r| r.text()).collect();
        assert_eq!(
            stems,
            vec![
                "What is the capital of France?",
                "Which planet is known as the Red Planet?",
                "What is H2O commonly called?",
            ]
        );
        let labels: Vec<Label> = records.iter().map(|r| r.correct_label()).collect();
        assert_eq!(labels, vec![Label::C, Label::A, Label::B]);
        assert_eq!(options(&records[0]), vec!["Berlin", "Madrid", "Paris", "Rome"]);
    }

    #[test]
    fn returns_at_most_max_questions() {
        assert_eq!(extract(THREE, 2).len(), 2);
        assert_eq!(extract(THREE, 3).len(), 3);
        assert_eq!(extract(THREE, 50).len(), 3);
        assert!(extract(THREE, 0).is_empty());
    }

    #[test]
    fn empty_input_yields_nothing() {
        for n in [0, 1, 10] {
            assert!(extract("", n).is_empty());
        }
    }

    #[test]
    fn unstructured_text_yields_nothing() {
        let text = "I'm sorry, I can't help with that request.";
        assert!(extract(text, 10).is_empty());
    }

    #[test]
    fn lowercase_answer_is_uppercased() {
        let text = SINGLE.replace("Answer: B", "Answer: d");
        assert_eq!(extract(&text, 1)[0].correct_label(), Label::D);
    }

    #[test]
    fn bad_answer_token_falls_back_to_a() {
        for marker in ["**Correct Answer: E**", "**Correct Answer: **", "**Correct Answer: B) 4**"] {
            let text = SINGLE.replace("**Correct Answer: B**", marker);
            let records = extract(&text, 1);
            assert_eq!(records.len(), 1, "{marker}");
            assert_eq!(records[0].correct_label(), Label::A, "{marker}");
        }
    }

    #[test]
    fn block_without_marker_is_skipped() {
        let text = "1. Orphan?\nA) w\nB) x\nC) y\nD) z\n\n2. What is 2+2?\nA) 3\nB) 4\nC) 5\nD) 6\n**Correct Answer: B**";
        let records = extract(text, 10);

        // Option values never span lines, so the unmarked block cannot borrow the next marker.
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].correct_label(), Label::B);
    }

    #[test]
    fn lenient_pass_reads_common_variations() {
        let text = "**Question 1:** Which gas do plants absorb?
(a) Oxygen
(b) Carbon dioxide
(c) Nitrogen
(d) Helium
**Answer:** B) Carbon dioxide

2) Largest ocean?
A. Atlantic
B. Indian
C. Pacific
D. Arctic
Correct answer - c
";
        let records = extract_lenient(text, 10);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text(), "Which gas do plants absorb?");
        assert_eq!(records[0].correct_value(), "Carbon dioxide");
        assert_eq!(records[1].text(), "Largest ocean?");
        assert_eq!(records[1].correct_label(), Label::C);
        assert_eq!(options(&records[1]), vec!["Atlantic", "Indian", "Pacific", "Arctic"]);
    }

    #[test]
    fn lenient_pass_defaults_missing_marker_and_drops_incomplete_blocks() {
        let text = "1. Complete but unmarked?\nA) w\nB) x\nC) y\nD) z\n2. Incomplete?\nA) only\nB) two\n";
        let records = extract_lenient(text, 10);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text(), "Complete but unmarked?");
        assert_eq!(records[0].correct_label(), Label::A);
    }

    #[test]
    fn lenient_pass_agrees_with_strict_on_well_formed_text() {
        assert_eq!(extract_lenient(THREE, 10), extract(THREE, 10));
        assert_eq!(extract_lenient(THREE, 1).len(), 1);
    }

    #[test]
    fn fallback_only_runs_when_strict_pass_is_empty() {
        let loose = "1) Loose?\nA. w\nB. x\nC. y\nD. z\nAnswer: D";
        assert!(extract(loose, 10).is_empty());
        assert_eq!(extract_with_fallback(loose, 10)[0].correct_label(), Label::D);

        let mixed = format!("{SINGLE}\n\n{loose}");
        let records = extract_with_fallback(&mixed, 10);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text(), "What is 2+2?");
    }
}
