//! Tables for the per-category summary and the transaction list.

use maud::{Markup, html};

use crate::{
    currency::CurrencyFormatter,
    dashboard::aggregation::CategoryTotal,
    html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE},
    transaction::{Transaction, TransactionType},
};

const TABLE_STYLE: &str = "w-full text-sm text-left text-gray-500 dark:text-gray-400";
const TABLE_CONTAINER_STYLE: &str = "overflow-x-auto rounded-lg shadow";

fn amount_style(transaction_type: TransactionType) -> &'static str {
    match transaction_type {
        TransactionType::Income => "text-green-600 dark:text-green-400",
        TransactionType::Expense => "text-red-600 dark:text-red-400",
    }
}

pub(super) fn category_summary_table(
    summary: &[CategoryTotal],
    formatter: &CurrencyFormatter,
) -> Markup {
    html! {
        section class="w-full"
        {
            h3 class="text-xl font-semibold mb-4" { "By Category" }

            div class=(TABLE_CONTAINER_STYLE)
            {
                table id="category-summary" class=(TABLE_STYLE)
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Transactions" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Total" }
                        }
                    }

                    tbody
                    {
                        @for total in summary {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                th scope="row" class=(TABLE_CELL_STYLE) { (total.category) }
                                td class=(TABLE_CELL_STYLE) { (total.transaction_type.title()) }
                                td class=(TABLE_CELL_STYLE) { (total.count) }
                                td class={(TABLE_CELL_STYLE) " " (amount_style(total.transaction_type))}
                                {
                                    (formatter.format(total.amount))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// The user's transactions, newest first.
///
/// Each amount is shown in the currency it was entered in.
pub(super) fn transactions_table(transactions: &[Transaction]) -> Markup {
    html! {
        section class="w-full"
        {
            h3 class="text-xl font-semibold mb-4" { "Transactions" }

            div class=(TABLE_CONTAINER_STYLE)
            {
                table id="transactions" class=(TABLE_STYLE)
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        }
                    }

                    tbody
                    {
                        @for transaction in transactions {
                            @let sign = match transaction.transaction_type {
                                TransactionType::Income => "+",
                                TransactionType::Expense => "-",
                            };

                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (transaction.date) }
                                td class=(TABLE_CELL_STYLE) { (transaction.description) }
                                td class=(TABLE_CELL_STYLE) { (transaction.category) }
                                td class={(TABLE_CELL_STYLE) " " (amount_style(transaction.transaction_type))}
                                {
                                    (sign)
                                    (CurrencyFormatter::new(&transaction.currency).format(transaction.amount))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
