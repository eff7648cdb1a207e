use chrono::{Duration, Utc};
use dcym_orders::domain::refund;
use dcym_orders::infrastructure::order_repo::InMemoryOrderRepository;
use dcym_orders::infrastructure::tone_output::LoggingToneOutput;
use dcym_orders::{
    demo_catalog, AppError, NewOrder, OrderService, PickupCodePlayer, PlaybackProgress, Settings,
};
use dotenvy::dotenv;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = Settings::from_env()?;
    let repo = InMemoryOrderRepository::new();
    let service = OrderService::new(repo.clone(), demo_catalog()?)
        .with_pickup_window(Duration::hours(settings.pickup_window_hours));
    let player = PickupCodePlayer::new(LoggingToneOutput, settings.tone_timing);

    let now = Utc::now();
    let order = service.create_order(
        NewOrder {
            user_id: "demo-student".to_string(),
            product_id: 1,
            machine_id: "library-lobby".to_string(),
            rental: true,
        },
        now,
    )?;
    log::info!("pickup code for order {} is {}", order.id, order.pickup_code);

    player
        .play(order.pickup_code.as_str(), |progress| match progress {
            PlaybackProgress::Digit(i) => log::debug!("digit {} playing", i),
            PlaybackProgress::Finished => log::info!("pickup code playback finished"),
        })
        .await?;

    service.confirm_pickup(&order.id, now)?;
    let returned_at = now + Duration::days(2);
    service.confirm_return(&order.id, returned_at)?;
    let queued = service.queue_refund(&order.id)?;
    if let Some(amount) = &queued.refund_amount {
        log::info!(
            "refund for order {} on day {}: {}",
            order.id,
            refund::rental_day(now, returned_at),
            refund::to_currency(amount)
        );
    }
    service.settle_refund(&order.id)?;

    for event in repo.drain_outbox()? {
        log::info!("outbox {} {}", event.event_type, event.payload);
    }
    Ok(())
}
