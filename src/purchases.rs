//! "What could this money buy" calculator.
//!
//! Subtracts a basket of costly items from one year of agency spending.
//! Costs are rough public estimates.

/// An item that can be bought with agency spending.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseItem {
    /// Key used on the command line, e.g. `clean-water`.
    pub key: &'static str,
    pub label: &'static str,
    /// Cost in dollars.
    pub cost: f64,
    /// Listed under "Just for fun" rather than the costly essentials.
    pub just_for_fun: bool,
}

pub const CATALOGUE: &[PurchaseItem] = &[
    PurchaseItem {
        key: "clean-water",
        label: "Clean water for everyone in the world",
        cost: 10_000_000_000.0,
        just_for_fun: false,
    },
    PurchaseItem {
        key: "broadband",
        label: "Deliver broadband internet to everyone in the U.S.",
        cost: 80_000_000_000.0,
        just_for_fun: false,
    },
    PurchaseItem {
        key: "refugees",
        label: "Resettle 1.2M Afghan refugees",
        cost: 18_200_000_000.0,
        just_for_fun: false,
    },
    PurchaseItem {
        key: "hunger",
        label: "End hunger in the U.S.",
        cost: 25_000_000_000.0,
        just_for_fun: false,
    },
    PurchaseItem {
        key: "homelessness",
        label: "End homelessness in the U.S.",
        cost: 20_000_000_000.0,
        just_for_fun: false,
    },
    PurchaseItem {
        key: "student-debt",
        label: "Pay off all outstanding U.S. private student loan debt",
        cost: 131_100_000_000.0,
        just_for_fun: false,
    },
    PurchaseItem {
        key: "mona-lisa",
        label: "Buy the Mona Lisa",
        cost: 900_000_000.0,
        just_for_fun: true,
    },
    PurchaseItem {
        key: "wizards",
        label: "Buy the Washington Wizards",
        cost: 1_930_000_000.0,
        just_for_fun: true,
    },
    PurchaseItem {
        key: "bezos",
        label: "Jeff Bezos' net worth",
        cost: 151_800_000_000.0,
        just_for_fun: true,
    },
];

pub fn find_item(key: &str) -> Option<&'static PurchaseItem> {
    CATALOGUE.iter().find(|item| item.key.eq_ignore_ascii_case(key))
}

/// A quantity of one catalogue item.
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    pub item: &'static PurchaseItem,
    pub quantity: u64,
}

impl Purchase {
    pub fn cost(&self) -> f64 {
        self.item.cost * self.quantity as f64
    }
}

/// Parse `ITEM=QTY` (or a bare `ITEM`, meaning one).
pub fn parse_purchase(value: &str) -> Result<Purchase, String> {
    let (key, quantity) = match value.split_once('=') {
        Some((key, quantity)) => {
            let quantity = quantity
                .trim()
                .parse::<u64>()
                .map_err(|_| format!("invalid quantity in '{}'", value))?;
            (key.trim(), quantity)
        }
        None => (value.trim(), 1),
    };

    let item = find_item(key).ok_or_else(|| {
        let keys: Vec<&str> = CATALOGUE.iter().map(|i| i.key).collect();
        format!("unknown item '{}' (expected one of: {})", key, keys.join(", "))
    })?;

    Ok(Purchase { item, quantity })
}

/// Outcome of spending a budget on a basket of purchases.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub budget: f64,
    /// Total cost as a negative amount.
    pub receipt: f64,
    pub remaining: f64,
    pub purchases: Vec<Purchase>,
}

impl Receipt {
    pub fn is_over_budget(&self) -> bool {
        self.remaining < 0.0
    }
}

/// Subtract every purchase from `budget`. Zero quantities are dropped.
pub fn checkout(budget: f64, purchases: &[Purchase]) -> Receipt {
    let purchases: Vec<Purchase> = purchases
        .iter()
        .filter(|p| p.quantity > 0)
        .cloned()
        .collect();
    let receipt = -purchases.iter().map(Purchase::cost).sum::<f64>();

    Receipt {
        budget,
        receipt,
        remaining: budget + receipt,
        purchases,
    }
}

/// Format with thousands separators and two decimals: `-1,234.50`.
pub fn format_amount(amount: f64) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let rounds_to_zero = formatted.chars().all(|c| c == '0' || c == '.');
    let sign = if amount < 0.0 && !rounds_to_zero {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, fraction)
}

/// Dollar amount: `$1,234.50`, `-$10.00`.
pub fn format_currency(amount: f64) -> String {
    let formatted = format_amount(amount);
    match formatted.strip_prefix('-') {
        Some(rest) => format!("-${}", rest),
        None => format!("${}", formatted),
    }
}

/// Short cost label as the catalogue lists it: `$10B`, `$900M`.
pub fn format_short(amount: f64) -> String {
    let trim = |value: f64| {
        let text = format!("{:.2}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    };
    if amount >= 1e9 {
        format!("${}B", trim(amount / 1e9))
    } else if amount >= 1e6 {
        format!("${}M", trim(amount / 1e6))
    } else {
        format_currency(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.5), "999.50");
        assert_eq!(format_amount(1000.0), "1,000.00");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(-10_000_000_000.0), "-10,000,000,000.00");
        assert_eq!(format_amount(-0.001), "0.00");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(25_000_000_000.0), "$25,000,000,000.00");
        assert_eq!(format_currency(-42.0), "-$42.00");
    }

    #[test]
    fn test_format_short() {
        assert_eq!(format_short(10_000_000_000.0), "$10B");
        assert_eq!(format_short(18_200_000_000.0), "$18.2B");
        assert_eq!(format_short(1_930_000_000.0), "$1.93B");
        assert_eq!(format_short(900_000_000.0), "$900M");
    }

    #[test]
    fn test_parse_purchase() {
        let purchase = parse_purchase("clean-water=2").unwrap();
        assert_eq!(purchase.item.key, "clean-water");
        assert_eq!(purchase.quantity, 2);

        assert_eq!(parse_purchase("Mona-Lisa").unwrap().quantity, 1);
        assert!(parse_purchase("yacht=1").is_err());
        assert!(parse_purchase("hunger=-1").is_err());
        assert!(parse_purchase("hunger=lots").is_err());
    }

    #[test]
    fn test_checkout() {
        let purchases = vec![
            parse_purchase("clean-water=2").unwrap(),
            parse_purchase("mona-lisa=1").unwrap(),
            parse_purchase("bezos=0").unwrap(),
        ];
        let receipt = checkout(50_000_000_000.0, &purchases);

        assert_eq!(receipt.receipt, -20_900_000_000.0);
        assert_eq!(receipt.remaining, 29_100_000_000.0);
        assert_eq!(receipt.purchases.len(), 2);
        assert!(!receipt.is_over_budget());

        let broke = checkout(1.0, &[parse_purchase("broadband").unwrap()]);
        assert!(broke.is_over_budget());
    }

    #[test]
    fn test_catalogue_keys_unique() {
        let mut keys: Vec<&str> = CATALOGUE.iter().map(|i| i.key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), CATALOGUE.len());
    }
}
