//! Outbound e-mail: Persian RTL templates plus the SMTP transport.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::{config::EmailConfig, entity::sea_orm_active_enums::OrderStatus};

const SENDER_NAME: &str = "اسب بان";

#[derive(Debug, Clone, PartialEq)]
pub struct EmailLineItem {
    pub name: String,
    pub quantity: i32,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmailTemplate {
    OrderConfirmation {
        name: String,
        order_number: String,
        total_amount: i64,
        items: Vec<EmailLineItem>,
        shipping_address: String,
    },
    OrderStatusUpdate {
        name: String,
        order_number: String,
        status: OrderStatus,
    },
    BookingReminder {
        name: String,
        service_name: String,
        booking_date: String,
        booking_time: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

impl EmailTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            EmailTemplate::OrderConfirmation { .. } => "orderConfirmation",
            EmailTemplate::OrderStatusUpdate { .. } => "orderStatusUpdate",
            EmailTemplate::BookingReminder { .. } => "bookingReminder",
        }
    }

    pub fn render(&self) -> RenderedEmail {
        match self {
            EmailTemplate::OrderConfirmation {
                name,
                order_number,
                total_amount,
                items,
                shipping_address,
            } => {
                let rows: String = items
                    .iter()
                    .map(|item| {
                        format!(
                            r#"<tr><td style="padding: 10px; border: 1px solid #ddd;">{}</td><td style="padding: 10px; text-align: center; border: 1px solid #ddd;">{}</td><td style="padding: 10px; text-align: left; border: 1px solid #ddd;">{} تومان</td></tr>"#,
                            escape_html(&item.name),
                            persian_digits(&item.quantity.to_string()),
                            format_toman(item.price),
                        )
                    })
                    .collect();
                let body = format!(
                    r#"<h1 style="color: #2c5530; text-align: center;">سفارش شما ثبت شد</h1>
{greeting}
<p>سفارش شما با موفقیت ثبت شد. جزئیات سفارش در زیر آمده است:</p>
<div style="background-color: #f8f9fa; padding: 20px; border-radius: 5px;">
<p><strong>شماره سفارش:</strong> {order_number}</p>
<p><strong>مبلغ کل:</strong> {total} تومان</p>
<p><strong>آدرس ارسال:</strong> {address}</p>
</div>
<h2 style="color: #2c5530; font-size: 18px;">محصولات سفارش:</h2>
<table style="width: 100%; border-collapse: collapse;">
<thead><tr><th>محصول</th><th>تعداد</th><th>قیمت</th></tr></thead>
<tbody>{rows}</tbody>
</table>
<p>شما می‌توانید وضعیت سفارش خود را از پنل کاربری پیگیری کنید.</p>"#,
                    greeting = greeting(name),
                    order_number = escape_html(order_number),
                    total = format_toman(*total_amount),
                    address = escape_html(shipping_address),
                );
                RenderedEmail {
                    subject: format!("تایید سفارش {order_number} - {SENDER_NAME}"),
                    html: layout(&body),
                }
            }
            EmailTemplate::OrderStatusUpdate {
                name,
                order_number,
                status,
            } => {
                let body = format!(
                    r#"<h1 style="color: #2c5530; text-align: center;">به‌روزرسانی سفارش</h1>
{greeting}
<p>وضعیت سفارش شما با شماره <strong>{order_number}</strong> تغییر کرده است.</p>
<div style="background-color: #f8f9fa; padding: 20px; border-radius: 5px; text-align: center;">
<p style="color: #2c5530; font-size: 18px; font-weight: bold;">{status}</p>
</div>
<p>شما می‌توانید جزئیات بیشتر را از پنل کاربری مشاهده کنید.</p>"#,
                    greeting = greeting(name),
                    order_number = escape_html(order_number),
                    status = status.label_fa(),
                );
                RenderedEmail {
                    subject: format!("به‌روزرسانی وضعیت سفارش {order_number} - {SENDER_NAME}"),
                    html: layout(&body),
                }
            }
            EmailTemplate::BookingReminder {
                name,
                service_name,
                booking_date,
                booking_time,
            } => {
                let body = format!(
                    r#"<h1 style="color: #2c5530; text-align: center;">یادآوری رزرو</h1>
{greeting}
<p>این ایمیل به عنوان یادآوری رزرو شما برای {service} ارسال شده است.</p>
<div style="background-color: #f8f9fa; padding: 20px; border-radius: 5px;">
<p><strong>نوع خدمات:</strong> {service}</p>
<p><strong>تاریخ:</strong> {date}</p>
<p><strong>ساعت:</strong> {time}</p>
</div>
<p>لطفاً در زمان مقرر حاضر باشید.</p>"#,
                    greeting = greeting(name),
                    service = escape_html(service_name),
                    date = escape_html(booking_date),
                    time = escape_html(booking_time),
                );
                RenderedEmail {
                    subject: format!("یادآوری رزرو {service_name} - {SENDER_NAME}"),
                    html: layout(&body),
                }
            }
        }
    }
}

fn greeting(name: &str) -> String {
    format!("<p>سلام <strong>{}</strong>،</p>", escape_html(name))
}

fn layout(body: &str) -> String {
    format!(
        r#"<div dir="rtl" style="font-family: Tahoma, Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; background-color: #f5f5f5;">
<div style="background-color: #ffffff; padding: 30px; border-radius: 10px;">
{body}
<p style="color: #666; font-size: 14px; text-align: center; border-top: 1px solid #eee; padding-top: 20px;">با تشکر،<br><strong>تیم {SENDER_NAME}</strong></p>
</div>
</div>"#
    )
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Maps ASCII digits to Persian digits, leaving everything else untouched.
pub fn persian_digits(input: &str) -> String {
    input
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(d) if c.is_ascii_digit() => char::from_u32(0x06F0 + d).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// `1250000` -> `۱٬۲۵۰٬۰۰۰`
pub fn format_toman(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('٬');
        }
        grouped.push(c);
    }
    if amount < 0 {
        grouped.insert(0, '-');
    }
    persian_digits(&grouped)
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, email: &EmailTemplate) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig, user: &str, pass: &str) -> anyhow::Result<Self> {
        let builder = if config.smtp_secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
        };
        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(user.to_string(), pass.to_string()))
            .build();
        let from = Mailbox::new(Some(SENDER_NAME.to_string()), user.parse()?);
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, email: &EmailTemplate) -> anyhow::Result<()> {
        let rendered = email.render();
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(rendered.subject)
            .header(ContentType::TEXT_HTML)
            .body(rendered.html)?;

        let response = self.transport.send(message).await?;
        tracing::debug!(to, template = email.name(), code = %response.code(), "email sent");
        Ok(())
    }
}

/// Stand-in when sending is disabled: records intent in the log and succeeds.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, email: &EmailTemplate) -> anyhow::Result<()> {
        tracing::info!(to, template = email.name(), "email disabled, not sending");
        Ok(())
    }
}

pub fn build_mailer(config: &EmailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    if !config.enabled {
        return Ok(Arc::new(LogMailer));
    }
    match (&config.smtp_user, &config.smtp_pass) {
        (Some(user), Some(pass)) => Ok(Arc::new(SmtpMailer::new(config, user, pass)?)),
        _ => {
            tracing::error!("EMAIL_ENABLED is set but SMTP_USER/SMTP_PASS are missing; e-mail disabled");
            Ok(Arc::new(LogMailer))
        }
    }
}
