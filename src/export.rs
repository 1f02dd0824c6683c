//! # PDF export
//!
//! Lays a document out on A4 with the same page template as the preview:
//! header on page one, a short running header on later pages, a table
//! header on every page, and the footer on the last page. Block heights
//! are measured from the blocks that get drawn, then handed to the
//! pagination engine, so exported pages match preview pages one to one.
//!
//! Text uses the standard Helvetica faces; characters outside printable
//! ASCII are replaced.

use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str};

use crate::pagination::{self, FallbackHeights, Measurements, PageGeometry, Pagination};
use crate::schema::{DocumentForm, DocumentType, LineItem};
use crate::totals::{Totals, format_amount};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const PAGE_PADDING: f32 = 36.0;
const LEFT: f32 = PAGE_PADDING;
const RIGHT: f32 = PAGE_WIDTH - PAGE_PADDING;

const COLUMN_DESCRIPTION: f32 = LEFT + 8.0;
const COLUMN_QUANTITY: f32 = 300.0;
const COLUMN_UNIT_PRICE: f32 = 410.0;
const COLUMN_TAX: f32 = 465.0;
const COLUMN_AMOUNT: f32 = RIGHT - 8.0;
const COLUMN_BILL_TO: f32 = 310.0;
const COLUMN_TOTALS: f32 = 360.0;

const DESCRIPTION_WRAP: usize = 56;
const ADDRESS_WRAP: usize = 44;
const NOTES_WRAP: usize = 100;

// Line caps keep every block within one printable page.
const MAX_ADDRESS_LINES: usize = 8;
const MAX_DESCRIPTION_LINES: usize = 24;
const MAX_NOTES_LINES: usize = 12;

const REGULAR: Name<'static> = Name(b"F1");
const BOLD: Name<'static> = Name(b"F2");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone)]
struct Cell {
    x: f32,
    text: String,
    face: Face,
    size: f32,
    align: Align,
}

impl Cell {
    fn left(x: f32, text: impl Into<String>, face: Face, size: f32) -> Self {
        Self {
            x,
            text: text.into(),
            face,
            size,
            align: Align::Left,
        }
    }

    fn right(x: f32, text: impl Into<String>, face: Face, size: f32) -> Self {
        Self {
            align: Align::Right,
            ..Self::left(x, text, face, size)
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn estimated_width(&self) -> f32 {
        let average = match self.face {
            Face::Regular => 0.5,
            Face::Bold => 0.55,
        };
        self.text.chars().count() as f32 * self.size * average
    }
}

/// One horizontal band of text. `rule` draws a hairline along its top.
#[derive(Debug, Clone, Default)]
struct Row {
    height: f32,
    cells: Vec<Cell>,
    rule: bool,
}

impl Row {
    fn new(height: f32) -> Self {
        Self {
            height,
            ..Self::default()
        }
    }

    fn ruled(mut self) -> Self {
        self.rule = true;
        self
    }

    fn cell(mut self, cell: Cell) -> Self {
        self.cells.push(cell);
        self
    }
}

#[derive(Debug, Clone, Default)]
struct Block {
    rows: Vec<Row>,
}

impl Block {
    fn height(&self) -> f32 {
        self.rows.iter().map(|row| row.height).sum()
    }

    fn push(&mut self, row: Row) {
        self.rows.push(row);
    }
}

/// Finished document plus the pagination it was drawn from.
#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub bytes: Vec<u8>,
    pub pagination: Pagination,
}

impl ExportedPdf {
    pub fn page_count(&self) -> usize {
        self.pagination.page_count()
    }
}

pub fn export_filename(form: &DocumentForm) -> String {
    let number = form
        .settings
        .invoice_number
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect::<String>();
    let number = if number.is_empty() {
        "draft".to_string()
    } else {
        number
    };
    format!("{}-{number}.pdf", form.document_type.as_str())
}

pub fn geometry() -> PageGeometry {
    PageGeometry {
        page_height: f64::from(PAGE_HEIGHT),
        padding_top: f64::from(PAGE_PADDING),
        padding_bottom: f64::from(PAGE_PADDING),
        safety_margin: 12.0,
        margin: 12.0,
    }
}

/// Heights of every block of `form` as the exporter will draw them.
pub fn measure(form: &DocumentForm) -> Measurements {
    let totals = Totals::compute(form);
    Measurements {
        header: Some(f64::from(header_block(form).height())),
        header_spacer: Some(f64::from(spacer_block(form, 0, 1).height())),
        table_header: Some(f64::from(table_header_block().height())),
        footer: Some(f64::from(footer_block(form, &totals).height())),
        rows: form
            .items
            .iter()
            .map(|item| f64::from(item_block(item, form.settings.tax_rate).height()))
            .collect(),
    }
}

pub fn render_pdf(form: &DocumentForm) -> ExportedPdf {
    let totals = Totals::compute(form);
    let pagination = pagination::paginate_with(
        form.items.len(),
        &measure(form),
        &geometry(),
        &FallbackHeights::default(),
    );
    let page_count = pagination.page_count();

    let mut next_id = 1;
    let mut alloc = || {
        let id = Ref::new(next_id);
        next_id += 1;
        id
    };
    let catalog_id = alloc();
    let page_tree_id = alloc();
    let regular_id = alloc();
    let bold_id = alloc();
    let page_refs = (0..page_count)
        .map(|_| (alloc(), alloc()))
        .collect::<Vec<_>>();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id)
        .kids(page_refs.iter().map(|(page_id, _)| *page_id))
        .count(i32::try_from(page_count).unwrap_or(i32::MAX));
    pdf.type1_font(regular_id).base_font(Name(b"Helvetica"));
    pdf.type1_font(bold_id).base_font(Name(b"Helvetica-Bold"));

    for (index, (page, (page_id, content_id))) in
        pagination.pages.iter().zip(&page_refs).enumerate()
    {
        let mut content = Content::new();
        let mut top = PAGE_HEIGHT - PAGE_PADDING;

        let heading = if page.is_first_page {
            header_block(form)
        } else {
            spacer_block(form, index, page_count)
        };
        top = draw_block(&mut content, &heading, top);
        top = draw_block(&mut content, &table_header_block(), top);

        for item in page.slice(&form.items) {
            top = draw_block(&mut content, &item_block(item, form.settings.tax_rate), top);
        }
        if page.is_empty() {
            let message = if page.is_first_page {
                "No items added"
            } else {
                "No items on this page"
            };
            let mut empty = Block::default();
            empty.push(Row::new(24.0).cell(Cell::left(COLUMN_DESCRIPTION, message, Face::Regular, 9.0)));
            draw_block(&mut content, &empty, top);
        }

        if page.is_last_page {
            let footer = footer_block(form, &totals);
            draw_block(&mut content, &footer, PAGE_PADDING + footer.height());
        }

        let mut number = Block::default();
        number.push(Row::new(12.0).cell(Cell::right(
            RIGHT,
            format!("Page {} of {page_count}", index + 1),
            Face::Regular,
            7.0,
        )));
        draw_block(&mut content, &number, PAGE_PADDING - 8.0);

        pdf.stream(*content_id, &content.finish());

        let mut page_writer = pdf.page(*page_id);
        page_writer
            .media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT))
            .parent(page_tree_id)
            .contents(*content_id);
        page_writer
            .resources()
            .fonts()
            .pair(REGULAR, regular_id)
            .pair(BOLD, bold_id);
    }

    ExportedPdf {
        bytes: pdf.finish(),
        pagination,
    }
}

/// Draws `block` downward from `top` and returns the new top.
fn draw_block(content: &mut Content, block: &Block, top: f32) -> f32 {
    let mut top = top;
    for row in &block.rows {
        if row.rule {
            content
                .set_stroke_gray(0.8)
                .set_line_width(0.5)
                .move_to(LEFT, top)
                .line_to(RIGHT, top)
                .stroke();
        }
        let baseline = top - row.height + (row.height * 0.3).min(6.0);
        for cell in &row.cells {
            let x = match cell.align {
                Align::Left => cell.x,
                Align::Right => cell.x - cell.estimated_width(),
            };
            let face = match cell.face {
                Face::Regular => REGULAR,
                Face::Bold => BOLD,
            };
            let text = pdf_text(&cell.text);
            content
                .begin_text()
                .set_font(face, cell.size)
                .next_line(x, baseline)
                .show(Str(&text))
                .end_text();
        }
        top -= row.height;
    }
    top
}

fn pdf_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            ' '..='~' => u8::try_from(ch).unwrap_or(b'?'),
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

/// Keeps at most `max` lines, replacing the overflow with an ellipsis line.
fn clamp_lines(mut lines: Vec<String>, max: usize) -> Vec<String> {
    if lines.len() > max {
        lines.truncate(max.saturating_sub(1));
        lines.push("...".to_string());
    }
    lines
}

fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word;
            while word.chars().count() > width {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let split = word
                    .char_indices()
                    .nth(width)
                    .map_or(word.len(), |(offset, _)| offset);
                lines.push(word[..split].to_string());
                word = &word[split..];
            }
            if word.is_empty() {
                continue;
            }
            if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines
}

fn date_label(form: &DocumentForm) -> &'static str {
    match form.document_type {
        DocumentType::Invoice => "Date due",
        DocumentType::Quotation | DocumentType::Proposal => "Valid until",
    }
}

fn header_block(form: &DocumentForm) -> Block {
    let settings = &form.settings;
    let label = form.document_type.label();
    let mut block = Block::default();

    let mut title = Row::new(32.0).cell(Cell::left(LEFT, label, Face::Bold, 22.0));
    if settings.is_paid {
        let offset = Cell::left(LEFT, label, Face::Bold, 22.0).estimated_width();
        title = title.cell(Cell::left(LEFT + offset + 16.0, "PAID", Face::Bold, 14.0));
    }
    block.push(title);

    block.push(Row::new(13.0).cell(Cell::left(
        LEFT,
        format!("{label} number: {}", settings.invoice_number),
        Face::Regular,
        9.0,
    )));
    block.push(Row::new(13.0).cell(Cell::left(
        LEFT,
        format!("Date of issue: {}", settings.date.format("%m/%d/%Y")),
        Face::Regular,
        9.0,
    )));
    if !settings.is_paid {
        block.push(Row::new(13.0).cell(Cell::left(
            LEFT,
            format!("{}: {}", date_label(form), settings.due_date.format("%m/%d/%Y")),
            Face::Regular,
            9.0,
        )));
    }
    block.push(Row::new(20.0));

    block.push(
        Row::new(16.0)
            .cell(Cell::left(LEFT, "From", Face::Bold, 10.0))
            .cell(Cell::left(COLUMN_BILL_TO, "Bill to", Face::Bold, 10.0)),
    );

    let sender = &form.sender;
    let mut from = vec![(sender.name.clone(), Face::Bold)];
    let sender_address = sender
        .address
        .lines()
        .flat_map(|line| wrap_text(line, ADDRESS_WRAP))
        .collect();
    from.extend(
        clamp_lines(sender_address, MAX_ADDRESS_LINES)
            .into_iter()
            .map(|line| (line, Face::Regular)),
    );
    from.push((sender.email.clone(), Face::Regular));
    if !sender.gst_vat_id.trim().is_empty() {
        from.push((format!("GST: {}", sender.gst_vat_id), Face::Regular));
    }

    let client = &form.client;
    let mut bill_to = vec![(client.name.clone(), Face::Bold)];
    if !client.organization_name.trim().is_empty() {
        bill_to.push((client.organization_name.clone(), Face::Regular));
    }
    let address = client.postal_address();
    if address.is_empty() {
        bill_to.push(("Address not provided".to_string(), Face::Regular));
    } else {
        bill_to.extend(
            clamp_lines(wrap_text(&address, ADDRESS_WRAP), MAX_ADDRESS_LINES)
                .into_iter()
                .map(|line| (line, Face::Regular)),
        );
    }
    for extra in [&client.email, &client.phone] {
        if !extra.trim().is_empty() {
            bill_to.push((extra.clone(), Face::Regular));
        }
    }
    if !client.gst_vat_id.trim().is_empty() {
        bill_to.push((format!("GST: {}", client.gst_vat_id), Face::Regular));
    }

    for index in 0..from.len().max(bill_to.len()) {
        let mut row = Row::new(12.0);
        if let Some((text, face)) = from.get(index) {
            row = row.cell(Cell::left(LEFT, text.clone(), *face, 9.0));
        }
        if let Some((text, face)) = bill_to.get(index) {
            row = row.cell(Cell::left(COLUMN_BILL_TO, text.clone(), *face, 9.0));
        }
        block.push(row);
    }
    block.push(Row::new(20.0));

    let mut services = Row::new(22.0).cell(Cell::left(LEFT, "Services", Face::Bold, 13.0));
    if !settings.is_paid {
        services = services.cell(Cell::right(
            RIGHT,
            format!("Due date: {}", settings.due_date.format("%m/%d/%Y")),
            Face::Regular,
            9.0,
        ));
    }
    block.push(services);
    block
}

fn spacer_block(form: &DocumentForm, index: usize, page_count: usize) -> Block {
    let mut block = Block::default();
    block.push(
        Row::new(24.0)
            .cell(Cell::left(
                LEFT,
                format!(
                    "{} {}",
                    form.document_type.label(),
                    form.settings.invoice_number
                ),
                Face::Bold,
                9.0,
            ))
            .cell(Cell::right(
                RIGHT,
                format!("Page {} of {page_count}", index + 1),
                Face::Bold,
                9.0,
            )),
    );
    block.push(Row::new(8.0).ruled());
    block
}

fn table_header_block() -> Block {
    let mut block = Block::default();
    block.push(
        Row::new(22.0)
            .ruled()
            .cell(Cell::left(COLUMN_DESCRIPTION, "DESCRIPTION", Face::Bold, 8.0))
            .cell(Cell::left(COLUMN_QUANTITY, "QTY", Face::Bold, 8.0))
            .cell(Cell::right(COLUMN_UNIT_PRICE, "UNIT PRICE", Face::Bold, 8.0))
            .cell(Cell::right(COLUMN_TAX, "TAX", Face::Bold, 8.0))
            .cell(Cell::right(COLUMN_AMOUNT, "AMOUNT", Face::Bold, 8.0)),
    );
    block
}

fn item_block(item: &LineItem, tax_rate: f64) -> Block {
    let mut block = Block::default();
    block.push(
        Row::new(18.0)
            .ruled()
            .cell(Cell::left(
                COLUMN_DESCRIPTION,
                item.service.category().label(),
                Face::Bold,
                9.0,
            ))
            .cell(Cell::left(
                COLUMN_QUANTITY,
                item.quantity.to_string(),
                Face::Regular,
                9.0,
            ))
            .cell(Cell::right(
                COLUMN_UNIT_PRICE,
                format_amount(&item.currency, item.price),
                Face::Regular,
                9.0,
            ))
            .cell(Cell::right(COLUMN_TAX, format!("{tax_rate}%"), Face::Regular, 9.0))
            .cell(Cell::right(
                COLUMN_AMOUNT,
                format_amount(&item.currency, item.amount()),
                Face::Bold,
                9.0,
            )),
    );
    for line in clamp_lines(
        wrap_text(&item.description, DESCRIPTION_WRAP),
        MAX_DESCRIPTION_LINES,
    ) {
        block.push(Row::new(11.0).cell(Cell::left(COLUMN_DESCRIPTION, line, Face::Regular, 8.0)));
    }
    block.push(Row::new(6.0));
    block
}

fn footer_block(form: &DocumentForm, totals: &Totals) -> Block {
    let sender = &form.sender;
    let currency = totals.currency.as_str();
    let mut block = Block::default();
    block.push(Row::new(16.0).ruled());

    let mut amounts = vec![
        (
            "Subtotal".to_string(),
            format_amount(currency, totals.subtotal),
            Face::Regular,
        ),
        (
            format!("Tax ({}%)", totals.tax_rate),
            format_amount(currency, totals.tax_amount),
            Face::Regular,
        ),
    ];
    if totals.discount > 0.0 {
        amounts.push((
            "Discount".to_string(),
            format!("- {}", format_amount(currency, totals.discount)),
            Face::Regular,
        ));
    }
    amounts.push((
        "Total".to_string(),
        format_amount(currency, totals.total),
        Face::Bold,
    ));

    let signature = if sender.stamp.trim().is_empty() {
        Vec::new()
    } else {
        vec![
            (sender.name.clone(), Face::Bold),
            ("Authorized Signatory".to_string(), Face::Regular),
        ]
    };

    for index in 0..amounts.len().max(signature.len()) {
        let mut row = Row::new(15.0);
        if let Some((text, face)) = signature.get(index) {
            row = row.cell(Cell::left(LEFT + 24.0, text.clone(), *face, 9.0));
        }
        if let Some((label, amount, face)) = amounts.get(index) {
            let size = if *face == Face::Bold { 11.0 } else { 9.0 };
            row = row
                .cell(Cell::left(COLUMN_TOTALS, label.clone(), *face, size))
                .cell(Cell::right(RIGHT, amount.clone(), *face, size));
        }
        block.push(row);
    }

    if let Some(bank) = sender.bank_details.as_ref().filter(|bank| !bank.is_empty()) {
        block.push(Row::new(10.0));
        block.push(Row::new(14.0).cell(Cell::left(LEFT, "Bank details", Face::Bold, 9.0)));
        let entries = [
            ("Account name", &bank.account_name),
            ("Bank", &bank.bank_name),
            ("Bank address", &bank.bank_address),
            ("Account number", &bank.account_number),
            ("IFSC", &bank.ifsc_code),
            ("SWIFT", &bank.swift_code),
        ];
        for (label, value) in entries {
            if !value.trim().is_empty() {
                block.push(Row::new(11.0).cell(Cell::left(
                    LEFT,
                    format!("{label}: {value}"),
                    Face::Regular,
                    8.0,
                )));
            }
        }
    }

    for (label, value) in [
        ("Payment terms", &form.settings.payment_terms),
        ("Notes", &form.settings.notes),
    ] {
        if value.trim().is_empty() {
            continue;
        }
        block.push(Row::new(8.0));
        block.push(Row::new(12.0).cell(Cell::left(LEFT, label, Face::Bold, 8.0)));
        for line in clamp_lines(wrap_text(value, NOTES_WRAP), MAX_NOTES_LINES) {
            block.push(Row::new(11.0).cell(Cell::left(LEFT, line, Face::Regular, 8.0)));
        }
    }
    block
}
