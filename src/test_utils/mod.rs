#![allow(missing_docs)]

pub(crate) mod fakes;
pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;

pub(crate) use fakes::{
    FailingDocumentStore, RecordingDocumentStore, RecordingMailer, TEST_PASSWORD,
    create_verified_account, get_test_app_state, get_test_connection, signed_in_session,
    test_identity_config,
};
pub(crate) use form::{assert_form_input, assert_hx_endpoint, form_error_messages, must_get_form};
pub(crate) use html::{
    assert_valid_html, must_select, parse_html_document, parse_html_fragment, parse_markup,
    select_text,
};
pub(crate) use http::{assert_hx_redirect, get_header};
