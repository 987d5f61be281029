use rust_decimal::Decimal;

/// Monetary inputs of one document line.
#[derive(Debug, Clone, Copy)]
pub struct LineAmounts {
    pub unit_price: Decimal,
    pub quantity: i32,
    pub discount: Decimal,
}

/// Aggregate amounts written to a sale or purchase header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentTotals {
    /// Sum of line totals before tax.
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    /// subtotal + tax_amount.
    pub net_amount: Decimal,
}

/// Total of one line: unit_price * quantity - discount. Over-discounted
/// lines go negative and are accepted as-is.
pub fn line_total(unit_price: Decimal, quantity: i32, discount: Decimal) -> Decimal {
    unit_price * Decimal::from(quantity) - discount
}

/// Aggregates line amounts into document totals. A missing tax rate means
/// no tax, not a configured default.
pub fn document_totals(lines: &[LineAmounts], tax_rate: Option<Decimal>) -> DocumentTotals {
    let mut subtotal = Decimal::ZERO;
    let mut discount_amount = Decimal::ZERO;

    for line in lines {
        subtotal += line_total(line.unit_price, line.quantity, line.discount);
        discount_amount += line.discount;
    }

    let tax_amount = subtotal * tax_rate.unwrap_or(Decimal::ZERO);
    let net_amount = subtotal + tax_amount;

    DocumentTotals {
        subtotal,
        discount_amount,
        tax_amount,
        net_amount,
    }
}
