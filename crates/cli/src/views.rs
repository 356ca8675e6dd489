//! Terminal rendering for pages and notices.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::{BufRead, Write};

use rust_decimal::Decimal;
use secrecy::SecretString;
use shopease_client::{Notice, NoticeLevel, PaymentRequest, ProductData, Route};
use shopease_core::{
    AdminStats, Cart, CurrencyCode, CurrentUser, Order, OrderUser, Price, PriceBreakdown, Product,
};
use tokio::sync::broadcast;

fn money(amount: Decimal, currency: CurrencyCode) -> String {
    Price::new(amount, currency).to_string()
}

pub fn user(user: &CurrentUser) {
    println!("{} <{}> ({})", user.name, user.email, user.role);
}

pub fn product_list(data: &ProductData, currency: CurrencyCode) {
    if data.products.is_empty() {
        println!("No products found");
        return;
    }
    for product in &data.products {
        println!("{}", product_line(product, currency));
    }
    println!(
        "Page {} of {} ({} products)",
        data.current_page, data.total_pages, data.total
    );
}

fn product_line(product: &Product, currency: CurrencyCode) -> String {
    let stock = if product.in_stock() {
        format!("{} in stock", product.stock)
    } else {
        "out of stock".to_string()
    };
    format!(
        "{:<26} {:<32} {:>12}  [{}] {stock}",
        product.id.to_string(),
        product.name,
        money(product.price, currency),
        product.category
    )
}

pub fn product_detail(product: &Product, currency: CurrencyCode) {
    println!("{}", product.name);
    println!("  ID:       {}", product.id);
    println!("  Price:    {}", money(product.price, currency));
    println!("  Category: {}", product.category);
    println!("  Stock:    {}", product.stock);
    if let Some(image) = product.image() {
        println!("  Image:    {image}");
    }
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }
}

pub fn categories(categories: &[String]) {
    for category in categories {
        println!("{category}");
    }
}

pub fn cart(cart: &Cart, currency: CurrencyCode) {
    if cart.is_empty() {
        println!("Your cart is empty");
        return;
    }
    for item in &cart.items {
        println!(
            "{:<26} {:<32} {:>3} x {:>12} = {:>12}",
            item.id.to_string(),
            item.product.name,
            item.quantity,
            money(item.unit_price(), currency),
            money(item.line_total(), currency)
        );
    }
    println!("{} items", cart.item_count());
    pricing(&cart.pricing(), currency);
}

fn pricing(breakdown: &PriceBreakdown, currency: CurrencyCode) {
    for line in pricing_lines(breakdown, currency) {
        println!("{line}");
    }
}

fn pricing_lines(breakdown: &PriceBreakdown, currency: CurrencyCode) -> [String; 4] {
    let shipping = if breakdown.free_shipping() {
        "FREE".to_string()
    } else {
        money(breakdown.shipping, currency)
    };
    [
        format!("  Items:    {:>12}", money(breakdown.items, currency)),
        format!("  Tax:      {:>12}", money(breakdown.tax, currency)),
        format!("  Shipping: {shipping:>12}"),
        format!("  Total:    {:>12}", money(breakdown.total, currency)),
    ]
}

pub fn order_list(orders: &[Order], currency: CurrencyCode) {
    if orders.is_empty() {
        println!("No orders yet");
        return;
    }
    for order in orders {
        println!("{}", order_line(order, currency));
    }
}

fn order_line(order: &Order, currency: CurrencyCode) -> String {
    let placed = order
        .created_at
        .map_or_else(String::new, |at| at.format("%Y-%m-%d").to_string());
    let paid = if order.is_paid { "paid" } else { "unpaid" };
    let mut line = format!(
        "{:<26} {placed:<10} {:<10} {paid:<6} {:>12}",
        order.id.to_string(),
        order.status.to_string(),
        money(order.total_price, currency)
    );
    if let Some(owner) = order_owner(order) {
        line.push_str("  ");
        line.push_str(&owner);
    }
    line
}

fn order_owner(order: &Order) -> Option<String> {
    match order.user.as_ref()? {
        OrderUser::Profile(profile) if !profile.email.is_empty() => {
            Some(format!("{} <{}>", profile.name, profile.email))
        }
        OrderUser::Profile(profile) => Some(profile.name.clone()),
        OrderUser::Id(_) => None,
    }
}

pub fn order_detail(order: &Order, currency: CurrencyCode) {
    println!("Order {}", order.id);
    println!("  Status:  {}", order.status);
    println!("  Payment: {}", order.payment_method);
    match order.paid_at {
        Some(at) => println!("  Paid:    {}", at.format("%Y-%m-%d %H:%M")),
        None if order.is_paid => println!("  Paid:    yes"),
        None => println!("  Paid:    no"),
    }
    let address = &order.shipping_address;
    println!(
        "  Ship to: {}, {}, {} {}, {}",
        address.street, address.city, address.state, address.zip_code, address.country
    );
    println!();
    for item in &order.order_items {
        println!(
            "  {:<32} {:>3} x {:>12}",
            item.name,
            item.quantity,
            money(item.price, currency)
        );
    }
    pricing(&order.pricing(), currency);
}

pub fn admin_stats(stats: &AdminStats, currency: CurrencyCode) {
    println!("Products:          {}", stats.total_products);
    println!("Orders:            {}", stats.total_orders);
    println!("Revenue:           {}", money(stats.total_revenue, currency));
    println!("Pending orders:    {}", stats.pending_orders);
    println!("Processing orders: {}", stats.processing_orders);
}

pub fn payment_request(request: &PaymentRequest) {
    let amount = Price::new(Decimal::new(request.amount_minor, 2), request.currency);
    println!();
    println!("{} - {}", request.name, request.description);
    println!("  Amount:        {amount}");
    println!("  Gateway order: {}", request.gateway_order_id);
    println!("  Customer:      {}", request.prefill_name);
    println!("Enter '<payment_id> <signature>' to confirm, or an empty line to cancel:");
    let _ = std::io::stdout().flush();
}

pub fn redirect(route: &Route) {
    eprintln!("-> {route}");
}

/// Print every notice published while the command ran.
pub fn drain_notices(mut notices: broadcast::Receiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        match notice.level {
            NoticeLevel::Success => eprintln!("✓ {}", notice.message),
            NoticeLevel::Error => eprintln!("✗ {}", notice.message),
        }
    }
}

/// Prompt on stderr and read one line from stdin.
pub fn prompt_secret(prompt: &str) -> std::io::Result<SecretString> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(SecretString::from(line.trim_end_matches(['\r', '\n']).to_string()))
}

#[cfg(test)]
mod tests {
    use shopease_core::{OrderId, OrderStatus, PaymentMethod, ShippingAddress, UserSummary};

    use super::*;

    fn order(user: Option<OrderUser>) -> Order {
        Order {
            id: OrderId::new("o1"),
            user,
            order_items: Vec::new(),
            shipping_address: ShippingAddress::default(),
            payment_method: PaymentMethod::CashOnDelivery,
            items_price: Decimal::from(1200),
            tax_price: Decimal::from(216),
            shipping_price: Decimal::ZERO,
            total_price: Decimal::from(1416),
            is_paid: false,
            paid_at: None,
            status: OrderStatus::Pending,
            created_at: None,
        }
    }

    #[test]
    fn test_pricing_lines_show_free_shipping() {
        let lines = pricing_lines(&PriceBreakdown::from_subtotal(Decimal::from(1200)), CurrencyCode::INR);
        assert!(lines[2].ends_with("FREE"));
        assert!(lines[3].ends_with("₹1416.00"));

        let lines = pricing_lines(&PriceBreakdown::from_subtotal(Decimal::from(100)), CurrencyCode::INR);
        assert!(lines[2].ends_with("₹50.00"));
    }

    #[test]
    fn test_order_owner_only_for_profiles() {
        assert_eq!(order_owner(&order(None)), None);
        assert_eq!(
            order_owner(&order(Some(OrderUser::Id("u1".into())))),
            None
        );

        let profile = OrderUser::Profile(UserSummary {
            id: None,
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
        });
        let line = order_line(&order(Some(profile)), CurrencyCode::INR);
        assert!(line.ends_with("Asha <asha@example.com>"));
        assert!(line.contains("unpaid"));
    }
}
