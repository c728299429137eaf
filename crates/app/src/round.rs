use quiz_core::grading::Selection;
use quiz_core::model::{ChapterKey, QuestionType, RoundSummary, StudyMode};
use quiz_core::options::PresentedOptions;
use services::{
    Advance, AnswerFeedback, RoundLoopService, RoundReport, RoundSession, RoundStart, SubmitOutcome,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

type Input = Lines<BufReader<Stdin>>;
type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

/// One line of user input while a question is on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Key {
    Answer(Vec<usize>),
    Next,
    Prev,
    Report,
    Quit,
    Invalid(String),
}

/// Parse a line against the number of options on screen.
///
/// Answers are 1-based option numbers separated by spaces or commas.
fn parse_key(line: &str, option_count: usize, question_type: QuestionType) -> Key {
    match line.trim().to_ascii_lowercase().as_str() {
        "n" | "next" => return Key::Next,
        "p" | "prev" => return Key::Prev,
        "r" | "report" => return Key::Report,
        "q" | "quit" => return Key::Quit,
        "" => return Key::Invalid("type an option number, n, p, r or q".to_owned()),
        _ => {}
    }

    let mut positions = Vec::new();
    for token in line.split([' ', ',']).filter(|t| !t.trim().is_empty()) {
        let Ok(number) = token.trim().parse::<usize>() else {
            return Key::Invalid(format!("not an option number: {token}"));
        };
        if number == 0 || number > option_count {
            return Key::Invalid(format!("pick a number between 1 and {option_count}"));
        }
        if !positions.contains(&(number - 1)) {
            positions.push(number - 1);
        }
    }
    if positions.is_empty() {
        return Key::Invalid("type at least one option number".to_owned());
    }
    if question_type == QuestionType::Single && positions.len() != 1 {
        return Key::Invalid("pick exactly one option".to_owned());
    }
    Key::Answer(positions)
}

fn selection_for(presented: &PresentedOptions, positions: &[usize]) -> Selection {
    Selection::multi(positions.iter().filter_map(|&p| presented.get(p)))
}

async fn prompt(input: &mut Input, text: &str) -> AppResult<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(input.next_line().await?)
}

enum Ended {
    Completed,
    Quit,
}

/// Run rounds for a chapter until the user stops or nothing is left.
pub(crate) async fn run_rounds(
    service: &RoundLoopService,
    chapter: &ChapterKey,
    mode: StudyMode,
) -> AppResult<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let mut session = match service.start_round(chapter, mode).await? {
            RoundStart::Ready(session) => session,
            RoundStart::NoQuestions(empty) => {
                println!("{}", empty.message());
                return Ok(());
            }
        };

        if let Ended::Quit = drive(service, &mut session, &mut input).await? {
            return Ok(());
        }

        let summary = service.finish_summary(&session).await?;
        print_summary(&summary);

        if mode == StudyMode::ReviewOld {
            return Ok(());
        }
        let answer = prompt(&mut input, "Start another round? [y/N] ").await?;
        if !matches!(answer.as_deref().map(str::trim), Some("y" | "Y" | "yes")) {
            return Ok(());
        }
    }
}

async fn drive(
    service: &RoundLoopService,
    session: &mut RoundSession,
    input: &mut Input,
) -> AppResult<Ended> {
    let mut show = true;
    loop {
        if session.is_complete() {
            return Ok(Ended::Completed);
        }
        let Some(current) = session.current().cloned() else {
            return Ok(Ended::Completed);
        };
        let Some(presented) = session.current_options().cloned() else {
            return Ok(Ended::Completed);
        };

        if show {
            let progress = service.round_progress(session).await?;
            println!();
            println!(
                "[pass {} | {}/{} | {}/{} done]",
                progress.pass_number,
                progress.position + 1,
                progress.pass_len,
                progress.done,
                progress.total,
            );
            let hint = match current.question_type {
                QuestionType::Single => "choose one",
                QuestionType::Multi => "choose all that apply",
            };
            println!("{} ({hint})", current.question.question());
            for (pos, option) in presented.options().iter().enumerate() {
                println!("  {}. {option}", pos + 1);
            }
            if let Some((_, correct)) = session.current_answer() {
                println!("  (answered: {})", if correct { "correct" } else { "incorrect" });
            }
        }
        show = false;

        let Some(line) = prompt(input, "> ").await? else {
            return Ok(Ended::Quit);
        };
        match parse_key(&line, presented.len(), current.question_type) {
            Key::Quit => return Ok(Ended::Quit),
            Key::Invalid(message) => println!("{message}"),
            Key::Report => print_report(&session.report()),
            Key::Prev => {
                if session.retreat() {
                    show = true;
                } else {
                    println!("Already at the first question of this pass.");
                }
            }
            Key::Next => match service.advance(session).await? {
                Advance::Blocked => println!("Answer this question first."),
                Advance::Moved { .. } => show = true,
                Advance::NewPass { pass_number, len } => {
                    println!();
                    println!("Pass {pass_number}: {len} question(s) still to master.");
                    show = true;
                }
                Advance::RoundComplete => return Ok(Ended::Completed),
            },
            Key::Answer(positions) => {
                let selection = selection_for(&presented, &positions);
                match service.submit_answer(session, selection).await? {
                    SubmitOutcome::Answered(feedback) => print_feedback(&presented, &feedback),
                    SubmitOutcome::AlreadyAnswered => {
                        println!("Already answered. Press n to continue.");
                    }
                }
            }
        }
    }
}

fn print_feedback(presented: &PresentedOptions, feedback: &AnswerFeedback) {
    if feedback.is_correct {
        println!("Correct! (streak {})", feedback.streak);
    } else {
        let labels: Vec<String> = presented
            .options()
            .iter()
            .enumerate()
            .filter(|(_, option)| feedback.correct_answers.contains(*option))
            .map(|(pos, option)| format!("{}. {option}", pos + 1))
            .collect();
        println!("Incorrect. Correct answer(s): {}", labels.join(", "));
    }
    println!("{}", feedback.explanation);
}

fn print_report(report: &RoundReport) {
    println!();
    println!(
        "Report: {} answered, {} correct",
        report.answered(),
        report.correct()
    );
    for (number, entry) in report.entries.iter().enumerate() {
        let result = match entry.result {
            Some(true) => "correct",
            Some(false) => "incorrect",
            None => "not answered",
        };
        println!("{}. [{}] {} ({result})", number + 1, entry.question_type, entry.question);
        for option in &entry.options {
            let mark = if option.is_correct {
                " <- correct"
            } else if option.wrongly_selected {
                " <- your choice"
            } else {
                ""
            };
            println!("   {}. {}{mark}", option.label, option.text);
        }
        println!("   {}", entry.explanation);
    }
}

fn print_summary(summary: &RoundSummary) {
    let seconds = (summary.completed_at() - summary.started_at()).num_seconds();
    println!();
    println!("Round complete.");
    println!(
        "  {} question(s), {} pass(es), {} answer(s): {} correct, {} incorrect",
        summary.batch_size(),
        summary.passes(),
        summary.answers(),
        summary.correct(),
        summary.incorrect(),
    );
    println!(
        "  mastered: {}/{}  time: {}m{:02}s",
        summary.mastered(),
        summary.batch_size(),
        seconds / 60,
        seconds % 60
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_parse_navigation_and_answers() {
        assert_eq!(parse_key(" N ", 4, QuestionType::Single), Key::Next);
        assert_eq!(parse_key("p", 4, QuestionType::Single), Key::Prev);
        assert_eq!(parse_key("q", 4, QuestionType::Single), Key::Quit);
        assert_eq!(parse_key("2", 4, QuestionType::Single), Key::Answer(vec![1]));
        assert_eq!(parse_key("1, 3 3", 5, QuestionType::Multi), Key::Answer(vec![0, 2]));
    }

    #[test]
    fn keys_reject_bad_answers() {
        assert!(matches!(parse_key("5", 4, QuestionType::Single), Key::Invalid(_)));
        assert!(matches!(parse_key("1 2", 4, QuestionType::Single), Key::Invalid(_)));
        assert!(matches!(parse_key("x", 4, QuestionType::Multi), Key::Invalid(_)));
        assert!(matches!(parse_key("", 4, QuestionType::Multi), Key::Invalid(_)));
    }
}
