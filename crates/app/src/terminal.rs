//! Line-oriented terminal front-end: input parsing and the presenter.

use quiz_core::summary::{QuestionStatus, QuizSummary};
use quiz_core::timer::TimerPhase;
use services::quiz::ChoiceMark;
use services::{Cue, QuestionSnapshot, QuizPresenter};

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// 1-based display position.
    Choose(usize),
    Next,
    Prev,
    Skip,
    /// 1-based question number.
    Jump(usize),
    Review,
    Pause,
    Submit,
    End,
    Export,
    Help,
    Quit,
    Unknown(String),
}

impl Input {
    /// An empty line means "next", like pressing Enter on the quiz screen.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Next;
        }
        if let Ok(position) = line.parse::<usize>() {
            return Self::Choose(position);
        }

        let mut parts = line.split_whitespace();
        let head = parts.next().unwrap_or_default().to_ascii_lowercase();
        match (head.as_str(), parts.next()) {
            ("n" | "next", None) => Self::Next,
            ("p" | "prev", None) => Self::Prev,
            ("s" | "skip", None) => Self::Skip,
            ("g" | "go", Some(n)) => n
                .parse()
                .map_or_else(|_| Self::Unknown(line.to_string()), Self::Jump),
            ("r" | "review", None) => Self::Review,
            ("pause" | "space", None) => Self::Pause,
            ("submit", None) => Self::Submit,
            ("end", None) => Self::End,
            ("e" | "export", None) => Self::Export,
            ("h" | "help" | "?", None) => Self::Help,
            ("q" | "quit", None) => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

pub fn print_help() {
    println!("Commands:");
    println!("  <number>      pick that choice");
    println!("  n / <enter>   next question (submits on the last test question)");
    println!("  p             previous question");
    println!("  s             skip");
    println!("  g <number>    go to question");
    println!("  r             flag / unflag for review");
    println!("  pause         pause or resume");
    println!("  submit        submit (test mode)");
    println!("  end           end the quiz");
    println!("  e             export results to a JSON file");
    println!("  q             quit, keeping the session for `resume`");
}

pub fn print_low_time(remaining: u32) {
    println!("  {remaining}s left");
}

fn mark_symbol(mark: ChoiceMark) -> &'static str {
    match mark {
        ChoiceMark::Plain => " ",
        ChoiceMark::Selected => ">",
        ChoiceMark::Correct => "+",
        ChoiceMark::Incorrect => "x",
    }
}

#[must_use]
pub fn render_question(snapshot: &QuestionSnapshot) -> String {
    let mut out = String::new();
    let mut header = format!("Question {}/{}", snapshot.index + 1, snapshot.total);
    if !snapshot.category.is_empty() {
        header.push_str(&format!("  [{}]", snapshot.category));
    }
    if snapshot.difficulty.is_known() {
        header.push_str(&format!("  {}", snapshot.difficulty));
    }
    if snapshot.flagged {
        header.push_str("  (flagged)");
    }
    out.push_str(&header);
    out.push('\n');
    out.push_str(&snapshot.text);
    out.push('\n');

    for (position, choice) in snapshot.choices.iter().enumerate() {
        out.push_str(&format!(
            "  {} {}. {}\n",
            mark_symbol(choice.mark),
            position + 1,
            choice.text
        ));
    }

    let timer = &snapshot.timer;
    let clock = match timer.phase {
        TimerPhase::Paused => format!("paused at {}s", timer.remaining),
        TimerPhase::Expired => "time is up".to_string(),
        _ => format!("{}s / {}s", timer.remaining, timer.limit),
    };
    out.push_str(&format!(
        "{} | {} mode | answered {}/{}",
        clock, snapshot.mode, snapshot.answered, snapshot.total
    ));
    if !snapshot.flagged_indices.is_empty() {
        let flagged: Vec<String> = snapshot
            .flagged_indices
            .iter()
            .map(|i| (i + 1).to_string())
            .collect();
        out.push_str(&format!(" | review: {}", flagged.join(", ")));
    }
    if snapshot.locked {
        out.push_str(" | locked");
    }
    out
}

#[must_use]
pub fn render_summary(summary: &QuizSummary) -> String {
    let mut out = format!(
        "Score: {}/{} ({}%)  correct {}  incorrect {}  unanswered {}  time {}s\n",
        summary.correct,
        summary.total,
        summary.accuracy,
        summary.correct,
        summary.incorrect,
        summary.unanswered,
        summary.total_time
    );
    for item in &summary.breakdown {
        let status = match item.status {
            QuestionStatus::Correct => "correct",
            QuestionStatus::Incorrect => "incorrect",
            QuestionStatus::Unanswered => "unanswered",
        };
        out.push_str(&format!(
            "  {:>2}. {} - {}",
            item.index + 1,
            item.question,
            status
        ));
        if let Some(selected) = &item.selected {
            out.push_str(&format!(" ({selected})"));
        }
        out.push('\n');
    }
    if summary.celebrate() {
        out.push_str("Great job!\n");
    }
    out
}

/// Presenter that writes to stdout. Sound cues become a terminal bell.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPresenter;

impl QuizPresenter for TerminalPresenter {
    fn announce(&self, message: &str) {
        println!("* {message}");
    }

    fn question_entered(&self, snapshot: &QuestionSnapshot) {
        println!();
        println!("{}", render_question(snapshot));
    }

    fn answer_feedback(&self, correct: bool) {
        println!("{}", if correct { "Correct!" } else { "Incorrect." });
    }

    fn play_cue(&self, _cue: Cue) {
        print!("\x07");
    }

    fn session_finished(&self, summary: &QuizSummary) {
        println!();
        print!("{}", render_summary(summary));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Question, QuestionId, QuizConfig, Session};
    use quiz_core::time::fixed_now;

    #[test]
    fn parses_commands() {
        assert_eq!(Input::parse(""), Input::Next);
        assert_eq!(Input::parse(" 2 "), Input::Choose(2));
        assert_eq!(Input::parse("P"), Input::Prev);
        assert_eq!(Input::parse("g 4"), Input::Jump(4));
        assert_eq!(Input::parse("pause"), Input::Pause);
        assert_eq!(Input::parse("q"), Input::Quit);
        assert_eq!(Input::parse("g x"), Input::Unknown("g x".into()));
        assert_eq!(Input::parse("next now"), Input::Unknown("next now".into()));
    }

    fn session() -> Session {
        let questions = vec![
            Question::new(
                "q1",
                "What is the capital of France?",
                vec!["Paris".into(), "London".into()],
                "Paris",
            )
            .unwrap()
            .with_category("Geography"),
            Question::new("q2", "2 + 2 equals?", vec!["3".into(), "4".into()], "4").unwrap(),
        ];
        let mut s = Session::new(QuizConfig::default(), questions, fixed_now()).unwrap();
        s.timer_mut().start(30);
        s
    }

    #[test]
    fn renders_question_with_marks() {
        let mut s = session();
        s.set_answer(&QuestionId::new("q1"), "London");
        s.toggle_review(&QuestionId::new("q1"));
        let snapshot = QuestionSnapshot::from_session(&s).unwrap();

        let text = render_question(&snapshot);
        assert!(text.starts_with("Question 1/2  [Geography]  (flagged)"));
        assert!(text.contains("    1. Paris"));
        assert!(text.contains("  x 2. London"));
        assert!(text.contains("30s / 30s | practice mode | answered 1/2 | review: 1"));
    }

    #[test]
    fn renders_summary_breakdown() {
        let mut s = session();
        s.set_answer(&QuestionId::new("q1"), "Paris");
        let summary = QuizSummary::from_session(&s);

        let text = render_summary(&summary);
        assert!(text.starts_with("Score: 1/2 (50%)"));
        assert!(text.contains(" 1. What is the capital of France? - correct (Paris)"));
        assert!(text.contains(" 2. 2 + 2 equals? - unanswered"));
        assert!(!text.contains("Great job"));
    }
}
