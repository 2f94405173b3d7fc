use chrono::{DateTime, NaiveTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    OrderFilter, OrderLineView, OrderStatus, OrderView, PricedOrder,
};
use crate::domain::ports::OrderRepository;
use crate::schema::{order_lines, orders, products};

use super::models::{NewOrderLineRow, NewOrderRow, OrderLineRow, OrderRow};

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_view(order: OrderRow, mut lines: Vec<OrderLineRow>) -> Result<OrderView, DomainError> {
    let status = order
        .status
        .parse::<OrderStatus>()
        .map_err(|_| DomainError::Persistence(format!("Unrecognized stored status '{}'", order.status)))?;
    lines.sort_by_key(|l| l.position);
    Ok(OrderView {
        id: order.id,
        customer_name: order.customer_name,
        status,
        total_amount: order.total_amount,
        created_at: order.created_at,
        lines: lines
            .into_iter()
            .map(|l| OrderLineView {
                id: l.id,
                product_id: l.product_id,
                position: l.position,
                quantity: l.quantity,
                unit_price: l.unit_price,
            })
            .collect(),
    })
}

impl OrderRepository for DieselOrderRepository {
    fn place(&self, customer_name: &str, priced: PricedOrder) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        let result = conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Reserve stock line by line. The guard is evaluated against
            //    committed stock at decrement time, not the earlier read, so
            //    concurrent depletion between validation and commit cannot
            //    oversell. Returning Err aborts the transaction and reverts
            //    every decrement already applied in this invocation.
            for line in &priced.lines {
                let updated = diesel::update(
                    products::table
                        .filter(products::id.eq(line.product_id))
                        .filter(products::stock_quantity.ge(line.quantity)),
                )
                .set(products::stock_quantity.eq(products::stock_quantity - line.quantity))
                .execute(conn)?;

                if updated == 0 {
                    let current: Option<(String, i32)> = products::table
                        .filter(products::id.eq(line.product_id))
                        .select((products::name, products::stock_quantity))
                        .first(conn)
                        .optional()?;
                    return Err(match current {
                        Some((name, available)) => DomainError::InsufficientStock {
                            product_id: line.product_id,
                            name,
                            available,
                        },
                        None => DomainError::UnknownProduct(line.product_id),
                    });
                }
            }

            // 2. Insert the order
            let order_id = Uuid::new_v4();
            let order_row = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    customer_name: customer_name.to_string(),
                    status: OrderStatus::Pending.as_str().to_string(),
                    total_amount: priced.total_amount.clone(),
                })
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            // 3. Insert order lines, preserving request order via `position`
            let new_lines: Vec<NewOrderLineRow> = priced
                .lines
                .iter()
                .enumerate()
                .map(|(i, l)| NewOrderLineRow {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: l.product_id,
                    position: i as i32,
                    quantity: l.quantity,
                    unit_price: l.unit_price.clone(),
                })
                .collect();
            let line_rows = diesel::insert_into(order_lines::table)
                .values(&new_lines)
                .returning(OrderLineRow::as_returning())
                .get_results(conn)?;

            to_view(order_row, line_rows)
        });

        // A failed reservation was observed inside the aborted transaction,
        // where this request's own decrements were still visible. Re-read
        // committed stock so the caller sees real availability rather than a
        // value net of changes that were rolled back.
        match result {
            Err(DomainError::InsufficientStock { product_id, .. }) => {
                let current: Option<(String, i32)> = products::table
                    .filter(products::id.eq(product_id))
                    .select((products::name, products::stock_quantity))
                    .first(&mut conn)
                    .optional()?;
                Err(match current {
                    Some((name, available)) => DomainError::InsufficientStock {
                        product_id,
                        name,
                        available,
                    },
                    None => DomainError::UnknownProduct(product_id),
                })
            }
            other => other,
        }
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines = order_lines::table
            .filter(order_lines::order_id.eq(order.id))
            .select(OrderLineRow::as_select())
            .load(&mut conn)?;

        Ok(Some(to_view(order, lines)?))
    }

    fn list(&self, filter: OrderFilter) -> Result<Vec<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut query = orders::table
            .select(OrderRow::as_select())
            .order(orders::created_at.desc())
            .into_boxed();

        if let Some(status) = filter.status {
            query = query.filter(orders::status.eq(status.as_str()));
        }
        if let Some(date) = filter.date {
            let start =
                DateTime::<Utc>::from_naive_utc_and_offset(date.and_time(NaiveTime::MIN), Utc);
            let end = start + chrono::Duration::days(1);
            query = query
                .filter(orders::created_at.ge(start))
                .filter(orders::created_at.lt(end));
        }

        let rows = query.load(&mut conn)?;

        let lines = OrderLineRow::belonging_to(&rows)
            .select(OrderLineRow::as_select())
            .load(&mut conn)?
            .grouped_by(&rows);

        rows.into_iter()
            .zip(lines)
            .map(|(order, lines)| to_view(order, lines))
            .collect()
    }

    fn update_status(
        &self,
        id: Uuid,
        target: OrderStatus,
        expected: OrderStatus,
    ) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        // Optimistic guard: two concurrent transitions from the same origin
        // state cannot both affect a row.
        let updated = diesel::update(
            orders::table
                .filter(orders::id.eq(id))
                .filter(orders::status.eq(expected.as_str())),
        )
        .set(orders::status.eq(target.as_str()))
        .execute(&mut conn)?;

        if updated == 0 {
            let current: Option<String> = orders::table
                .filter(orders::id.eq(id))
                .select(orders::status)
                .first(&mut conn)
                .optional()?;
            return match current {
                None => Err(DomainError::OrderNotFound),
                Some(actual) => {
                    let from = actual.parse::<OrderStatus>().map_err(|_| {
                        DomainError::Persistence(format!("Unrecognized stored status '{}'", actual))
                    })?;
                    Err(DomainError::InvalidTransition { from, to: target })
                }
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    use super::DieselOrderRepository;
    use crate::db::DbPool;
    use crate::domain::errors::DomainError;
    use crate::domain::order::{OrderFilter, OrderStatus, PricedLine, PricedOrder};
    use crate::domain::ports::{CatalogRepository, OrderRepository};
    use crate::domain::product::{NewProduct, ProductView};
    use crate::infrastructure::catalog_repo::DieselCatalogRepository;
    use crate::infrastructure::test_support::setup_db;

    fn seed_product(pool: &DbPool, sku: &str, name: &str, price: &str, stock: i32) -> ProductView {
        DieselCatalogRepository::new(pool.clone())
            .create(NewProduct {
                sku: sku.to_string(),
                name: name.to_string(),
                unit_price: BigDecimal::from_str(price).expect("valid decimal"),
                stock_quantity: stock,
            })
            .expect("seed failed")
    }

    fn stock_of(pool: &DbPool, id: Uuid) -> i32 {
        DieselCatalogRepository::new(pool.clone())
            .find_by_id(id)
            .expect("find failed")
            .expect("product exists")
            .stock_quantity
    }

    fn priced(lines: Vec<(Uuid, i32, &str)>, total: &str) -> PricedOrder {
        PricedOrder {
            total_amount: BigDecimal::from_str(total).expect("valid decimal"),
            lines: lines
                .into_iter()
                .map(|(product_id, quantity, price)| PricedLine {
                    product_id,
                    quantity,
                    unit_price: BigDecimal::from_str(price).expect("valid decimal"),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn place_decrements_stock_and_persists_the_order() {
        let (_container, pool) = setup_db().await;
        let a = seed_product(&pool, "A-1", "Widget", "25.00", 10);
        let b = seed_product(&pool, "B-1", "Gadget", "9.99", 2);
        let repo = DieselOrderRepository::new(pool.clone());

        let order = repo
            .place(
                "Alice",
                priced(vec![(a.id, 3, "25.00"), (b.id, 1, "9.99")], "84.99"),
            )
            .expect("place failed");

        assert_eq!(order.customer_name, "Alice");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, BigDecimal::from_str("84.99").unwrap());
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].product_id, a.id);
        assert_eq!(order.lines[0].position, 0);
        assert_eq!(order.lines[1].product_id, b.id);

        assert_eq!(stock_of(&pool, a.id), 7);
        assert_eq!(stock_of(&pool, b.id), 1);

        let found = repo
            .find_by_id(order.id)
            .expect("find failed")
            .expect("order exists");
        assert_eq!(found.total_amount, order.total_amount);
        assert_eq!(found.lines.len(), 2);
    }

    #[tokio::test]
    async fn failed_reservation_reverts_every_decrement() {
        let (_container, pool) = setup_db().await;
        let a = seed_product(&pool, "A-1", "Widget", "25.00", 10);
        let b = seed_product(&pool, "B-1", "Gadget", "9.99", 2);
        let repo = DieselOrderRepository::new(pool.clone());

        // First line fits, second does not: the whole attempt must be undone.
        let err = repo
            .place(
                "Alice",
                priced(vec![(a.id, 3, "25.00"), (b.id, 5, "9.99")], "124.95"),
            )
            .unwrap_err();

        match err {
            DomainError::InsufficientStock {
                product_id,
                name,
                available,
            } => {
                assert_eq!(product_id, b.id);
                assert_eq!(name, "Gadget");
                assert_eq!(available, 2);
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }

        assert_eq!(stock_of(&pool, a.id), 10);
        assert_eq!(stock_of(&pool, b.id), 2);
        assert!(repo.list(OrderFilter::default()).expect("list failed").is_empty());
    }

    #[tokio::test]
    async fn vanished_product_fails_with_unknown_product_and_no_order() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let ghost = Uuid::new_v4();

        let err = repo
            .place("Alice", priced(vec![(ghost, 1, "1.00")], "1.00"))
            .unwrap_err();

        assert!(matches!(err, DomainError::UnknownProduct(id) if id == ghost));
        assert!(repo.list(OrderFilter::default()).expect("list failed").is_empty());
    }

    #[tokio::test]
    async fn duplicate_lines_jointly_over_stock_roll_back() {
        let (_container, pool) = setup_db().await;
        let a = seed_product(&pool, "A-1", "Widget", "2.00", 5);
        let repo = DieselOrderRepository::new(pool.clone());

        // Each line fits the snapshot on its own; the second conditional
        // decrement catches the joint excess mid-transaction. The reported
        // availability is the committed stock, not a value net of this
        // request's rolled-back decrements.
        let err = repo
            .place(
                "Alice",
                priced(vec![(a.id, 3, "2.00"), (a.id, 3, "2.00")], "12.00"),
            )
            .unwrap_err();

        match err {
            DomainError::InsufficientStock { available, .. } => assert_eq!(available, 5),
            other => panic!("expected InsufficientStock, got {:?}", other),
        }
        assert_eq!(stock_of(&pool, a.id), 5);
        assert!(repo.list(OrderFilter::default()).expect("list failed").is_empty());
    }

    #[tokio::test]
    async fn concurrent_placements_never_oversell() {
        let (_container, pool) = setup_db().await;
        let a = seed_product(&pool, "A-1", "Widget", "1.00", 5);

        let spawn_place = |qty: i32| {
            let repo = DieselOrderRepository::new(pool.clone());
            let product_id = a.id;
            std::thread::spawn(move || {
                repo.place(
                    "Racer",
                    PricedOrder {
                        total_amount: BigDecimal::from(qty),
                        lines: vec![PricedLine {
                            product_id,
                            quantity: qty,
                            unit_price: BigDecimal::from(1),
                        }],
                    },
                )
            })
        };

        let first = spawn_place(3);
        let second = spawn_place(4);
        let results = [
            first.join().expect("thread panicked"),
            second.join().expect("thread panicked"),
        ];

        let succeeded: Vec<i32> = results
            .iter()
            .filter(|r| r.is_ok())
            .map(|r| r.as_ref().map(|o| o.lines[0].quantity).expect("checked ok"))
            .collect();
        assert_eq!(succeeded.len(), 1, "3 + 4 > 5, only one may win");

        for result in &results {
            if let Err(e) = result {
                assert!(matches!(e, DomainError::InsufficientStock { .. }));
            }
        }

        let final_stock = stock_of(&pool, a.id);
        assert_eq!(final_stock, 5 - succeeded.iter().sum::<i32>());
        assert!(final_stock >= 0);
    }

    #[tokio::test]
    async fn status_update_is_conditioned_on_expected_state() {
        let (_container, pool) = setup_db().await;
        let a = seed_product(&pool, "A-1", "Widget", "1.00", 5);
        let repo = DieselOrderRepository::new(pool.clone());

        let order = repo
            .place("Alice", priced(vec![(a.id, 1, "1.00")], "1.00"))
            .expect("place failed");

        repo.update_status(order.id, OrderStatus::Approved, OrderStatus::Pending)
            .expect("transition failed");

        // Stale expectation: the row is Approved now, so a Pending-based
        // update must lose and report the actual state.
        let err = repo
            .update_status(order.id, OrderStatus::Cancelled, OrderStatus::Pending)
            .unwrap_err();
        match err {
            DomainError::InvalidTransition { from, to } => {
                assert_eq!(from, OrderStatus::Approved);
                assert_eq!(to, OrderStatus::Cancelled);
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }

        let found = repo
            .find_by_id(order.id)
            .expect("find failed")
            .expect("order exists");
        assert_eq!(found.status, OrderStatus::Approved);
    }

    #[tokio::test]
    async fn status_update_on_unknown_order_fails_with_not_found() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);

        let err = repo
            .update_status(Uuid::new_v4(), OrderStatus::Approved, OrderStatus::Pending)
            .unwrap_err();

        assert!(matches!(err, DomainError::OrderNotFound));
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let (_container, pool) = setup_db().await;
        let a = seed_product(&pool, "A-1", "Widget", "1.00", 10);
        let repo = DieselOrderRepository::new(pool.clone());

        let first = repo
            .place("Alice", priced(vec![(a.id, 1, "1.00")], "1.00"))
            .expect("place failed");
        repo.place("Bob", priced(vec![(a.id, 2, "1.00")], "2.00"))
            .expect("place failed");
        repo.update_status(first.id, OrderStatus::Approved, OrderStatus::Pending)
            .expect("transition failed");

        let approved = repo
            .list(OrderFilter {
                status: Some(OrderStatus::Approved),
                date: None,
            })
            .expect("list failed");

        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, first.id);
        assert_eq!(approved[0].lines.len(), 1);

        let all = repo.list(OrderFilter::default()).expect("list failed");
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn list_filters_by_utc_calendar_day() {
        let (_container, pool) = setup_db().await;
        let a = seed_product(&pool, "A-1", "Widget", "1.00", 10);
        let repo = DieselOrderRepository::new(pool.clone());

        let order = repo
            .place("Alice", priced(vec![(a.id, 1, "1.00")], "1.00"))
            .expect("place failed");

        // Derive the day from the persisted timestamp so the test is immune
        // to running across midnight.
        let day = order.created_at.date_naive();

        let hit = repo
            .list(OrderFilter {
                status: None,
                date: Some(day),
            })
            .expect("list failed");
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].id, order.id);

        // The window is [midnight, next midnight): adjacent days miss.
        let yesterday = day.pred_opt().expect("valid date");
        let tomorrow = day.succ_opt().expect("valid date");
        for miss_day in [yesterday, tomorrow] {
            let miss = repo
                .list(OrderFilter {
                    status: None,
                    date: Some(miss_day),
                })
                .expect("list failed");
            assert!(miss.is_empty(), "day {} should not match", miss_day);
        }
    }
}
