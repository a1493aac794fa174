//! Kitchen ticket renderer
//!
//! Renders a committed ticket into the three text blocks a kitchen
//! printer lays out: header, optional instruction, items table. Physical
//! output goes through the `PrintSink` port; the engine ships a tracing
//! sink as the default.

use crate::models::Ticket;

const DEFAULT_WIDTH: usize = 48;

/// Rendered ticket, one string per layout block
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTicket {
    pub header: String,
    /// Empty when the ticket carries no instruction
    pub instruction_block: String,
    pub items_table: String,
}

impl RenderedTicket {
    pub fn to_plain_text(&self) -> String {
        if self.instruction_block.is_empty() {
            format!("{}\n{}", self.header, self.items_table)
        } else {
            format!(
                "{}\n{}\n{}",
                self.header, self.instruction_block, self.items_table
            )
        }
    }
}

/// Output port for rendered tickets
pub trait PrintSink: Send + Sync {
    fn emit(&self, ticket: &RenderedTicket);
}

/// Default sink: writes the rendered ticket to the log
pub struct LogPrintSink;

impl PrintSink for LogPrintSink {
    fn emit(&self, ticket: &RenderedTicket) {
        tracing::info!("\n{}", ticket.to_plain_text());
    }
}

pub struct TicketRenderer {
    width: usize,
}

impl Default for TicketRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH)
    }
}

impl TicketRenderer {
    /// `width` is the paper width in characters (48 for 80mm paper)
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    pub fn render(&self, ticket: &Ticket) -> RenderedTicket {
        RenderedTicket {
            header: self.render_header(ticket),
            instruction_block: self.render_instruction(ticket),
            items_table: self.render_items(ticket),
        }
    }

    fn render_header(&self, ticket: &Ticket) -> String {
        let mut out = String::new();
        out.push_str(&self.center(&format!("KOT #{}", ticket.bill_no)));
        out.push('\n');
        out.push_str(&self.center(ticket.order_type.label()));
        out.push('\n');
        out.push_str(&self.center(&ticket.date));
        out.push('\n');
        out.push_str(&"=".repeat(self.width));
        out
    }

    fn render_instruction(&self, ticket: &Ticket) -> String {
        match &ticket.instruction {
            Some(instruction) => format!("Note: {}\n{}", instruction, "-".repeat(self.width)),
            None => String::new(),
        }
    }

    fn render_items(&self, ticket: &Ticket) -> String {
        let name_width = self.width.saturating_sub(18).max(12);
        let mut out = String::new();

        out.push_str(&format!(
            "{:<4}{:<name_width$}{:>4}{:>10}\n",
            "No.", "Item", "Qty", "Amount"
        ));
        out.push_str(&"-".repeat(self.width));
        out.push('\n');

        for (i, item) in ticket.items.iter().enumerate() {
            let name = match &item.size {
                Some(size) => format!("{} ({})", item.name, size),
                None => item.name.clone(),
            };
            out.push_str(&format!(
                "{:<4}{:<name_width$}{:>4}{:>10}\n",
                i + 1,
                name,
                item.quantity,
                item.line_total()
            ));
        }

        out.push_str(&"-".repeat(self.width));
        out.push('\n');
        out.push_str(&format!(
            "{:>width$}\n",
            format!("Total: {}", ticket.total()),
            width = self.width
        ));
        out
    }

    fn center(&self, text: &str) -> String {
        if text.len() >= self.width {
            return text.to_string();
        }
        let pad = (self.width - text.len()) / 2;
        format!("{}{}", " ".repeat(pad), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineItem, OrderType};
    use rust_decimal::Decimal;

    fn ticket(instruction: Option<&str>) -> Ticket {
        Ticket {
            bill_no: "0042".to_string(),
            timestamp: 1705905000000,
            date: "22/01/2024, 12:00:00".to_string(),
            items: vec![
                LineItem {
                    name: "Margherita".into(),
                    price: Decimal::from(200),
                    size: None,
                    product_id: "p1".into(),
                    category: "Veg Pizza".into(),
                    quantity: 2,
                },
                LineItem {
                    name: "Cold Coffee".into(),
                    price: Decimal::from(120),
                    size: Some("Large".into()),
                    product_id: "p2".into(),
                    category: "Beverages".into(),
                    quantity: 1,
                },
            ],
            order_type: OrderType::DineIn,
            instruction: instruction.map(String::from),
        }
    }

    #[test]
    fn test_header_has_bill_no_and_channel_label() {
        let rendered = TicketRenderer::default().render(&ticket(None));
        assert!(rendered.header.contains("KOT #0042"));
        assert!(rendered.header.contains("Dine-In"));
        assert!(rendered.header.contains("22/01/2024, 12:00:00"));
    }

    #[test]
    fn test_instruction_block_empty_when_absent() {
        let rendered = TicketRenderer::default().render(&ticket(None));
        assert!(rendered.instruction_block.is_empty());

        let with_note = TicketRenderer::default().render(&ticket(Some("Less spicy")));
        assert!(with_note.instruction_block.contains("Note: Less spicy"));
    }

    #[test]
    fn test_items_table_lists_lines_and_total() {
        let rendered = TicketRenderer::default().render(&ticket(None));
        assert!(rendered.items_table.contains("Margherita"));
        assert!(rendered.items_table.contains("Cold Coffee (Large)"));
        // 2 x 200 + 1 x 120
        assert!(rendered.items_table.contains("Total: 520"));
    }

    #[test]
    fn test_plain_text_skips_empty_instruction() {
        let plain = TicketRenderer::default().render(&ticket(None)).to_plain_text();
        assert!(!plain.contains("Note:"));
        assert!(!plain.contains("\n\n"));
    }
}
