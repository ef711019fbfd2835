//! Cards showing the income, expense and balance totals.

use maud::{Markup, html};

use crate::{currency::CurrencyFormatter, dashboard::aggregation::Totals};

const CARD_STYLE: &str = "bg-white dark:bg-gray-800 border border-gray-200 \
    dark:border-gray-700 rounded-lg p-4 shadow-md";
const GREEN_STYLE: &str = "text-green-600 dark:text-green-400";
const RED_STYLE: &str = "text-red-600 dark:text-red-400";

fn total_card(id: &str, title: &str, amount: &str, amount_style: &str) -> Markup {
    html! {
        div id=(id) class=(CARD_STYLE)
        {
            h4 class="text-sm font-medium text-gray-600 dark:text-gray-400" { (title) }
            p class={"mt-2 text-2xl font-bold " (amount_style)} { (amount) }
        }
    }
}

/// The total income, total expenses and balance, side by side.
pub(super) fn totals_cards(totals: &Totals, formatter: &CurrencyFormatter) -> Markup {
    let balance = totals.balance();
    let balance_style = if balance >= 0.0 { GREEN_STYLE } else { RED_STYLE };

    html! {
        div class="grid grid-cols-1 sm:grid-cols-3 gap-4 w-full"
        {
            (total_card("total-income", "Income", &formatter.format(totals.income), GREEN_STYLE))
            (total_card("total-expenses", "Expenses", &formatter.format(totals.expenses), RED_STYLE))
            (total_card("balance", "Balance", &formatter.format(balance), balance_style))
        }
    }
}
