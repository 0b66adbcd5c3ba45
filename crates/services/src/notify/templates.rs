//! Subject/body builders for every outbound email. Plain `format!`
//! HTML, one builder per notification event.

use bson::DateTime;

pub fn format_nok(ore: i64) -> String {
    format!("{},{:02} kr", ore / 100, (ore % 100).abs())
}

pub fn format_date(date: DateTime) -> String {
    date.to_chrono().format("%d.%m.%Y").to_string()
}

fn wrap(title: &str, body: &str) -> String {
    format!(
        "<html><body>\
         <h2>{title}</h2>\
         {body}\
         <p>— Anbud</p>\
         </body></html>"
    )
}

pub fn invitation(tender_title: &str, deadline: DateTime, link: &str) -> (String, String) {
    (
        format!("Invitation to tender: {tender_title}"),
        wrap(
            "You have been invited to bid",
            &format!(
                "<p>You are invited to submit a bid for <strong>{tender_title}</strong>.</p>\
                 <p>Bid deadline: {}.</p>\
                 <p><a href=\"{link}\">Open the tender</a></p>",
                format_date(deadline)
            ),
        ),
    )
}

pub fn question_answered(tender_title: &str, question: &str, answer: &str) -> (String, String) {
    (
        format!("Your question on \"{tender_title}\" was answered"),
        wrap(
            "Question answered",
            &format!(
                "<p><strong>Your question:</strong> {question}</p>\
                 <p><strong>Answer:</strong> {answer}</p>"
            ),
        ),
    )
}

pub fn bid_submitted(tender_title: &str, bidder_name: &str, total_ore: i64) -> (String, String) {
    (
        format!("New bid on \"{tender_title}\""),
        wrap(
            "A new bid has arrived",
            &format!(
                "<p>{bidder_name} submitted a bid of {} on \
                 <strong>{tender_title}</strong>.</p>",
                format_nok(total_ore)
            ),
        ),
    )
}

pub fn awarded(tender_title: &str, standstill_end: DateTime) -> (String, String) {
    (
        format!("Your bid on \"{tender_title}\" has been selected"),
        wrap(
            "Congratulations",
            &format!(
                "<p>Your bid on <strong>{tender_title}</strong> has been selected.</p>\
                 <p>The statutory standstill period runs until {}. The contract \
                 can be signed after that date.</p>",
                format_date(standstill_end)
            ),
        ),
    )
}

pub fn rejected(tender_title: &str) -> (String, String) {
    (
        format!("Outcome of the tender \"{tender_title}\""),
        wrap(
            "Tender outcome",
            &format!(
                "<p>Another bid has been selected for <strong>{tender_title}</strong>.</p>\
                 <p>Thank you for participating. You may contest the decision \
                 during the standstill period.</p>"
            ),
        ),
    )
}

pub fn signing_requested(tender_title: &str, link: &str) -> (String, String) {
    (
        format!("Contract ready for signing: {tender_title}"),
        wrap(
            "Contract ready for signing",
            &format!(
                "<p>The contract for <strong>{tender_title}</strong> has been \
                 generated and awaits your signature.</p>\
                 <p><a href=\"{link}\">Review and sign</a></p>"
            ),
        ),
    )
}

pub fn contract_signed(tender_title: &str, signer_name: &str) -> (String, String) {
    (
        format!("Contract signed: {tender_title}"),
        wrap(
            "Contract signed",
            &format!(
                "<p>{signer_name} has signed the contract for \
                 <strong>{tender_title}</strong>.</p>"
            ),
        ),
    )
}

pub fn contract_amended(
    tender_title: &str,
    field: &str,
    version: u32,
) -> (String, String) {
    (
        format!("Contract amended: {tender_title}"),
        wrap(
            "Contract amended",
            &format!(
                "<p>The contract for <strong>{tender_title}</strong> was amended \
                 (field <code>{field}</code>, now version {version}).</p>"
            ),
        ),
    )
}

pub fn deadline_reminder(
    tender_title: &str,
    deadline: DateTime,
    days_left: i64,
) -> (String, String) {
    (
        format!("{days_left} day(s) left to bid on \"{tender_title}\""),
        wrap(
            "Bid deadline approaching",
            &format!(
                "<p>The deadline for <strong>{tender_title}</strong> is {} — \
                 {days_left} day(s) from now. No bid has been registered from \
                 you yet.</p>",
                format_date(deadline)
            ),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_ore_as_kroner() {
        assert_eq!(format_nok(1_234_56), "1234,56 kr");
        assert_eq!(format_nok(100), "1,00 kr");
        assert_eq!(format_nok(5), "0,05 kr");
    }

    #[test]
    fn reminder_subject_carries_days_left() {
        let (subject, body) = deadline_reminder("Roof works", DateTime::now(), 3);
        assert!(subject.contains("3 day(s)"));
        assert!(body.contains("Roof works"));
    }
}
