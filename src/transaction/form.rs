//! The dialog and form for adding a transaction.

use maud::{Markup, html};

use crate::{
    currency::CurrencyFormatter,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, loading_spinner,
    },
    transaction::{TransactionEntryForm, TransactionType},
};

pub const TRANSACTION_DIALOG_ID: &str = "transaction-dialog";

/// The button that opens the transaction dialog.
pub fn add_transaction_button() -> Markup {
    html! {
        button
            type="button"
            data-open-dialog=(TRANSACTION_DIALOG_ID)
            class="px-4 py-2 bg-blue-500 dark:bg-blue-600 hover:bg-blue-600
                hover:dark:bg-blue-700 text-white rounded"
        {
            "Add Transaction"
        }
    }
}

/// A modal dialog wrapping [transaction_form].
pub fn transaction_dialog(form: &TransactionEntryForm, formatter: &CurrencyFormatter) -> Markup {
    html! {
        dialog
            id=(TRANSACTION_DIALOG_ID)
            open[form.is_open]
            class="w-full max-w-md p-6 rounded-lg shadow-xl bg-white dark:bg-gray-800
                text-gray-900 dark:text-white backdrop:bg-black/50"
        {
            h2 class="mb-4 text-xl font-bold" { "Add Transaction" }

            (transaction_form(form, formatter))
        }
    }
}

/// The form for entering one transaction.
///
/// A successful submit replaces the form with an empty one. Errors are shown
/// as alerts and leave the form as it was.
pub fn transaction_form(form: &TransactionEntryForm, formatter: &CurrencyFormatter) -> Markup {
    let is_expense = form.transaction_type == TransactionType::Expense;

    html! {
        form
            id="transaction-form"
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-disabled-elt="find button[type='submit']"
            class="space-y-4"
        {
            fieldset class="space-y-2"
            {
                legend class=(FORM_LABEL_STYLE) { "Type" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    (type_radio(TransactionType::Expense, is_expense))
                    (type_radio(TransactionType::Income, !is_expense))
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE)
                {
                    "Amount (" (formatter.currency_code()) ")"
                }

                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    required
                    value=(form.amount)
                    hx-get=(endpoints::TRANSACTION_PREVIEW)
                    hx-trigger="input changed delay:300ms"
                    hx-target="#amount-preview"
                    hx-swap="outerHTML"
                    class=(FORM_TEXT_INPUT_STYLE);

                (amount_preview(form.preview(formatter).as_deref()))
            }

            (category_field(form.transaction_type, &form.category))

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    name="description"
                    id="description"
                    type="text"
                    placeholder="What was this for?"
                    required
                    value=(form.description)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    name="date"
                    id="date"
                    type="date"
                    required
                    value=(form.date)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="flex flex-row gap-2"
            {
                button
                    type="button"
                    data-close-dialog
                    disabled[form.submitting]
                    class=(BUTTON_SECONDARY_STYLE)
                {
                    "Cancel"
                }

                button
                    type="submit"
                    id="submit-button"
                    disabled[form.submitting]
                    class=(BUTTON_PRIMARY_STYLE)
                {
                    span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                    "Add " (form.transaction_type.title())
                }
            }
        }
    }
}

fn type_radio(transaction_type: TransactionType, checked: bool) -> Markup {
    let id = format!("transaction-type-{transaction_type}");

    html! {
        div class="flex-1"
        {
            input
                name="type_"
                id=(id)
                type="radio"
                value=(transaction_type)
                checked[checked]
                required
                hx-get=(endpoints::TRANSACTION_CATEGORIES)
                hx-trigger="change"
                hx-target="#category-field"
                hx-swap="outerHTML"
                hx-include="#category-field"
                class=(FORM_RADIO_INPUT_STYLE);

            label for=(id) class=(FORM_RADIO_LABEL_STYLE) { (transaction_type.title()) }
        }
    }
}

/// The category select for `transaction_type` with `selected` picked.
///
/// The type the options belong to is kept in a hidden field so that the
/// categories endpoint can tell whether the type has changed.
pub fn category_field(transaction_type: TransactionType, selected: &str) -> Markup {
    html! {
        div id="category-field"
        {
            label for="category" class=(FORM_LABEL_STYLE) { "Category" }

            input type="hidden" name="category_type" value=(transaction_type);

            select
                name="category"
                id="category"
                required
                class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" selected[selected.is_empty()] { "Select a category" }

                @for category in transaction_type.categories() {
                    option value=(category) selected[*category == selected] { (category) }
                }
            }
        }
    }
}

/// The formatted amount shown under the amount field.
pub fn amount_preview(preview: Option<&str>) -> Markup {
    html! {
        p id="amount-preview" class="mt-1 text-sm text-gray-500 dark:text-gray-400"
        {
            @if let Some(preview) = preview {
                (preview)
            }
        }
    }
}
