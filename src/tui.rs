use std::io::{self, Write};

use crossterm::{cursor, style::{self, Stylize}, terminal, QueueableCommand};

use rusty_solitaire::anchor::{AnchorKind, CardAnchor};
use rusty_solitaire::{AutoMove, Card, Game, Notice, Suit};

pub const MIN_TERMINAL_WIDTH: u16 = 80;
const TYPICAL_BOARD_HEIGHT: u16 = 24;

const CARD_PRINT_WIDTH: u16 = 7;
const CARD_PRINT_HEIGHT: u16 = 5;
const TABLEAU_VERTICAL_OFFSET: u16 = 2;
const FAN_OFFSET: u16 = 3;
const TOP_ROW: u16 = 1;
const TABLEAU_ROW: u16 = TOP_ROW + CARD_PRINT_HEIGHT + 1;

const DEFAULT_TERMINAL_WIDTH: u16 = 80;
const DEFAULT_TERMINAL_HEIGHT: u16 = 24;

/// What occupies one card slot on screen.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Face {
    Up(Card),
    Down,
    Empty,
}

/// How a card slot is emphasised.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Plain,
    Highlighted,
    Selected,
    /// Still moving towards this pile.
    Arriving,
}

pub struct View {
    cursor: usize,
    high_contrast: bool,
    message: Option<String>,
}

impl View {
    pub fn new() -> View {
        View {
            cursor: 0,
            high_contrast: false,
            message: None,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn toggle_high_contrast(&mut self) {
        self.high_contrast = !self.high_contrast;
    }

    pub fn move_cursor_left(&mut self, game: &Game) {
        let count = game.anchors().len();
        self.cursor = (self.cursor + count - 1) % count;
    }

    pub fn move_cursor_right(&mut self, game: &Game) {
        self.cursor = (self.cursor + 1) % game.anchors().len();
    }

    /// Keeps the cursor on the board after a switch to a smaller layout.
    pub fn clamp(&mut self, game: &Game) {
        if self.cursor >= game.anchors().len() {
            self.cursor = 0;
        }
    }

    pub fn note(&mut self, notice: Notice) {
        self.message = match notice {
            Notice::Won => Some("You win!".to_string()),
            Notice::ScoreChanged(_) => return,
            Notice::StatusChanged(status) => Some(status),
            Notice::StockDone => Some("The stock is done".to_string()),
        };
    }

    pub fn say(&mut self, message: &str) {
        self.message = Some(message.to_string());
    }

    pub fn print(&self, out: &mut io::Stdout, game: &Game) -> Result<(), io::Error> {
        out.queue(terminal::Clear(terminal::ClearType::All))?;
        if !game.is_won() {
            self.print_board(out, game)?;
            self.print_chrome(out, game)?;
        } else {
            out.queue(style::SetAttribute(style::Attribute::Dim))?;
            self.print_board(out, game)?;
            out.queue(style::SetAttribute(style::Attribute::Reset))?;
            self.print_chrome(out, game)?;
            if !game.is_replaying() {
                self.print_win(out, game)?;
            }
        }
        if game.is_paused() {
            self.print_boxed(out, &["Paused", "Resume: p"])?;
        }
        out.flush()?;
        Ok(())
    }

    fn print_board(&self, out: &mut io::Stdout, game: &Game) -> Result<(), io::Error> {
        let (_, term_height) = terminal_size();
        let mut top_x = 1;
        let mut column = 0;

        for anchor in game.anchors() {
            let number = anchor.number();
            let highlighted = number == self.cursor && !game.is_won();
            let held = game
                .held()
                .filter(|&(from, _)| from == number)
                .map_or(&[][..], |(_, cards)| cards);
            let arriving = game
                .in_flight()
                .filter(|t| t.to == number)
                .map_or(&[][..], |t| t.cards.as_slice());

            match anchor.kind() {
                AnchorKind::Generic(_) => {
                    let x = column * CARD_PRINT_WIDTH + 2;
                    column += 1;
                    let slots = column_slots(anchor, held, arriving);
                    self.print_column(out, x, &slots, highlighted, term_height)?;
                }
                AnchorKind::DealTo { showing } => {
                    let mut slots: Vec<(Face, Mark)> =
                        anchor.fanned().iter().map(|&c| (Face::Up(c), Mark::Plain)).collect();
                    slots.extend(held.iter().map(|&c| (Face::Up(c), Mark::Selected)));
                    slots.extend(arriving.iter().map(|&c| (Face::Up(c), Mark::Arriving)));
                    let skip = slots.len().saturating_sub(showing.max(1));
                    self.print_fan(out, top_x, &slots[skip..], highlighted)?;
                    top_x += CARD_PRINT_WIDTH + FAN_OFFSET * (showing.max(1) as u16 - 1);
                }
                _ => {
                    let face = if let Some(&card) = held.last() {
                        (Face::Up(card), Mark::Selected)
                    } else if let Some(&card) = arriving.last() {
                        (Face::Up(card), Mark::Arriving)
                    } else {
                        match anchor.top() {
                            Some(_) if !anchor.is_face_up(anchor.count() - 1) => {
                                (Face::Down, Mark::Plain)
                            }
                            Some(&card) => (Face::Up(card), Mark::Plain),
                            None => (Face::Empty, Mark::Plain),
                        }
                    };
                    let mark = if highlighted { Mark::Highlighted } else { face.1 };
                    self.print_card_at_coord(out, top_x, TOP_ROW, face.0, mark)?;
                    top_x += CARD_PRINT_WIDTH;
                }
            }
        }

        Ok(())
    }

    fn print_column(
        &self,
        out: &mut io::Stdout,
        x: u16,
        slots: &[(Face, Mark)],
        highlighted: bool,
        term_height: u16,
    ) -> Result<(), io::Error> {
        if slots.is_empty() {
            let mark = if highlighted { Mark::Highlighted } else { Mark::Plain };
            return self.print_card_at_coord(out, x, TABLEAU_ROW, Face::Empty, mark);
        }
        let last = slots.len() - 1;
        for (y, &(face, mark)) in slots.iter().enumerate() {
            let row = TABLEAU_ROW + y as u16 * TABLEAU_VERTICAL_OFFSET;
            if row >= term_height.saturating_sub(1) {
                break;
            }
            let mark = if highlighted && y == last { Mark::Highlighted } else { mark };
            self.print_card_at_coord(out, x, row, face, mark)?;
        }
        Ok(())
    }

    fn print_fan(
        &self,
        out: &mut io::Stdout,
        x: u16,
        slots: &[(Face, Mark)],
        highlighted: bool,
    ) -> Result<(), io::Error> {
        if slots.is_empty() {
            let mark = if highlighted { Mark::Highlighted } else { Mark::Plain };
            return self.print_card_at_coord(out, x, TOP_ROW, Face::Empty, mark);
        }
        let last = slots.len() - 1;
        for (i, &(face, mark)) in slots.iter().enumerate() {
            let mark = if highlighted && i == last { Mark::Highlighted } else { mark };
            self.print_card_at_coord(out, x + i as u16 * FAN_OFFSET, TOP_ROW, face, mark)?;
        }
        Ok(())
    }

    fn print_chrome(&self, out: &mut io::Stdout, game: &Game) -> Result<(), io::Error> {
        let (_, term_height) = terminal_size();
        let width = MIN_TERMINAL_WIDTH as usize;

        let seconds = game.elapsed_ms() / 1000;
        let moves = game.history().len();
        let mut right = format!(" Moves: {moves} ─ {}:{:02} ", seconds / 60, seconds % 60);
        if let Some(status) = game.status() {
            right = format!(" {status} ─{right}");
        }
        out.queue(cursor::MoveTo(0, 0))?;
        print!("{}", bar('╭', &format!(" {} ", game.pretty_game_type()), &right, '╮', width));

        for i in 1..term_height {
            out.queue(cursor::MoveTo(0, i))?;
            print!("│");
            out.queue(cursor::MoveTo(MIN_TERMINAL_WIDTH - 1, i))?;
            print!("│");
        }

        let auto = match game.settings().auto_move {
            AutoMove::Always => "auto",
            AutoMove::FlingOnly => "fling",
            AutoMove::Never => "off",
        };
        let left = match &self.message {
            Some(message) => format!(" {message} "),
            None => " d:deal f:fling z:undo r:restart 1-4:game p:pause q:quit ".to_string(),
        };
        out.queue(cursor::MoveTo(0, term_height))?;
        print!("{}", bar('╰', &left, &format!(" a:{auto} "), '╯', width));

        Ok(())
    }

    fn print_card_at_coord(
        &self,
        out: &mut io::Stdout,
        x: u16,
        y: u16,
        face: Face,
        mark: Mark,
    ) -> Result<(), io::Error> {
        let label = match face {
            Face::Up(card) => card.to_string(),
            Face::Down | Face::Empty => String::new(),
        };
        let card_display_str = match (face, mark) {
            (Face::Down, _) => "\
                ╭─────╮\n\
                │░░░░░│\n\
                │░░░░░│\n\
                │░░░░░│\n\
                ╰─────╯\n"
                .to_string(),
            (_, Mark::Selected) => format!(
                "\
                ╭─────╮\n\
                │ {: <3} │\n\
                │     │\n\
                │  △  │\n\
                ╰─────╯\n",
                label
            ),
            _ => format!(
                "\
                ╭─────╮\n\
                │ {: <3} │\n\
                │     │\n\
                │     │\n\
                ╰─────╯\n",
                label
            ),
        };

        let dim = face == Face::Empty || mark == Mark::Arriving;
        for (d, line) in card_display_str.lines().enumerate() {
            out.queue(cursor::MoveTo(x, y + d as u16))?;
            if mark == Mark::Highlighted {
                out.queue(style::SetAttribute(style::Attribute::Reverse))?;
            } else if dim {
                out.queue(style::SetAttribute(style::Attribute::Dim))?;
            }

            match face {
                Face::Up(card) => print!("{}", line.with(self.suit_color(card.suit))),
                _ => print!("{}", line),
            }

            if mark == Mark::Highlighted {
                out.queue(style::SetAttribute(style::Attribute::NoReverse))?;
            } else if dim {
                out.queue(style::SetAttribute(style::Attribute::NormalIntensity))?;
            }
        }
        Ok(())
    }

    fn suit_color(&self, suit: Suit) -> style::Color {
        if self.high_contrast {
            match suit {
                Suit::Hearts => style::Color::DarkRed,
                Suit::Clubs => style::Color::White,
                Suit::Diamonds => style::Color::Magenta,
                Suit::Spades => style::Color::Yellow,
            }
        } else if suit.is_red() {
            style::Color::Red
        } else {
            style::Color::Reset
        }
    }

    fn print_win(&self, out: &mut io::Stdout, game: &Game) -> Result<(), io::Error> {
        let score = game.score().map(|s| format!("Score: {s}"));
        let mut lines = vec!["You Win!"];
        if let Some(score) = &score {
            lines.push(score.as_str());
        }
        lines.push("New Game: ctrl-n");
        self.print_boxed(out, &lines)
    }

    fn print_boxed(&self, out: &mut io::Stdout, lines: &[&str]) -> Result<(), io::Error> {
        let inner = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 2;
        let x = (MIN_TERMINAL_WIDTH / 2).saturating_sub(inner as u16 / 2 + 1);
        let y = (TYPICAL_BOARD_HEIGHT / 2).saturating_sub(lines.len() as u16 / 2 + 1);

        let mut boxed = vec![format!("╭{}╮", "─".repeat(inner))];
        boxed.extend(lines.iter().map(|l| format!("│ {: <w$} │", l, w = inner - 2)));
        boxed.push(format!("╰{}╯", "─".repeat(inner)));
        for (i, line) in boxed.iter().enumerate() {
            out.queue(cursor::MoveTo(x, y + i as u16))?;
            print!("{}", line);
        }
        Ok(())
    }
}

/// Slots of a tableau column: its cards, then held cards, then cards still
/// on their way.
fn column_slots(anchor: &CardAnchor, held: &[Card], arriving: &[Card]) -> Vec<(Face, Mark)> {
    let mut slots: Vec<(Face, Mark)> = anchor
        .cards()
        .iter()
        .enumerate()
        .map(|(i, &card)| {
            if anchor.is_face_up(i) {
                (Face::Up(card), Mark::Plain)
            } else {
                (Face::Down, Mark::Plain)
            }
        })
        .collect();
    slots.extend(held.iter().map(|&c| (Face::Up(c), Mark::Selected)));
    slots.extend(arriving.iter().map(|&c| (Face::Up(c), Mark::Arriving)));
    slots
}

/// A horizontal frame line `width` columns wide with text at both ends.
fn bar(open: char, left: &str, right: &str, close: char, width: usize) -> String {
    let used = 6 + left.chars().count() + right.chars().count();
    let fill = width.saturating_sub(used);
    format!("{open}──{left}{}{right}──{close}", "─".repeat(fill))
}

fn terminal_size() -> (u16, u16) {
    terminal::size().unwrap_or((DEFAULT_TERMINAL_WIDTH, DEFAULT_TERMINAL_HEIGHT))
}
