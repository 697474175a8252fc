//! Built-in seed examples and the fixed intent pattern taxonomy.

use super::{Example, Pattern};

pub fn default_examples() -> Vec<Example> {
    vec![
        Example::new("Show me all users", "SELECT * FROM users")
            .with_category("basic_select")
            .with_difficulty("easy"),
        Example::new(
            "Find users who signed up last month",
            "SELECT * FROM users WHERE created_at >= DATE_TRUNC('month', CURRENT_DATE - INTERVAL '1 month') AND created_at < DATE_TRUNC('month', CURRENT_DATE)",
        )
        .with_category("date_filtering")
        .with_difficulty("medium"),
        Example::new(
            "Count the number of orders per customer",
            "SELECT customer_id, COUNT(*) as order_count FROM orders GROUP BY customer_id",
        )
        .with_category("aggregation")
        .with_difficulty("medium"),
        Example::new(
            "Get the top 10 customers by total order value",
            "SELECT customer_id, SUM(order_total) as total_value FROM orders GROUP BY customer_id ORDER BY total_value DESC LIMIT 10",
        )
        .with_category("aggregation_ordering")
        .with_difficulty("hard"),
        Example::new(
            "Show me products and their categories",
            "SELECT p.name, c.name as category_name FROM products p JOIN categories c ON p.category_id = c.id",
        )
        .with_category("joins")
        .with_difficulty("medium"),
        Example::new(
            "Find customers who have placed more than 5 orders",
            "SELECT customer_id FROM orders GROUP BY customer_id HAVING COUNT(*) > 5",
        )
        .with_category("having_clause")
        .with_difficulty("hard"),
        Example::new(
            "Get the average order value by month",
            "SELECT DATE_TRUNC('month', order_date) as month, AVG(order_total) as avg_order_value FROM orders GROUP BY DATE_TRUNC('month', order_date) ORDER BY month",
        )
        .with_category("date_aggregation")
        .with_difficulty("hard"),
        Example::new(
            "Find products that are out of stock",
            "SELECT * FROM products WHERE stock_quantity = 0",
        )
        .with_category("condition_filtering")
        .with_difficulty("easy"),
        Example::new(
            "Show me the most expensive product in each category",
            "SELECT p.name, p.price, c.name as category FROM products p JOIN categories c ON p.category_id = c.id WHERE p.price = (SELECT MAX(price) FROM products WHERE category_id = p.category_id)",
        )
        .with_category("subqueries")
        .with_difficulty("hard"),
        Example::new(
            "Get customers who haven't placed any orders",
            "SELECT * FROM customers WHERE id NOT IN (SELECT DISTINCT customer_id FROM orders)",
        )
        .with_category("not_in_subquery")
        .with_difficulty("hard"),
    ]
}

/// The six-entry taxonomy, in declaration order.
pub fn default_patterns() -> Vec<Pattern> {
    vec![
        Pattern::new(
            "count",
            &["count", "number of", "how many", "total"],
            "SELECT COUNT(*) FROM {table}",
            "Counting records",
        ),
        Pattern::new(
            "sum",
            &["sum", "total", "sum of", "add up"],
            "SELECT SUM({column}) FROM {table}",
            "Summing values",
        ),
        Pattern::new(
            "average",
            &["average", "avg", "mean", "average of"],
            "SELECT AVG({column}) FROM {table}",
            "Calculating averages",
        ),
        Pattern::new(
            "group_by",
            &["per", "by", "group by", "for each"],
            "SELECT {columns} FROM {table} GROUP BY {group_columns}",
            "Grouping results",
        ),
        Pattern::new(
            "order_by",
            &["order by", "sort by", "highest", "lowest", "top", "bottom"],
            "SELECT {columns} FROM {table} ORDER BY {order_column} {direction}",
            "Ordering results",
        ),
        Pattern::new(
            "date_filter",
            &["today", "yesterday", "last week", "last month", "this year"],
            "SELECT {columns} FROM {table} WHERE {date_column} {condition}",
            "Date-based filtering",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_examples_are_well_formed() {
        let examples = default_examples();
        assert_eq!(examples.len(), 10);
        assert!(examples.iter().all(|e| e.is_well_formed()));
    }

    #[test]
    fn test_taxonomy_order() {
        let names: Vec<String> = default_patterns().into_iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec!["count", "sum", "average", "group_by", "order_by", "date_filter"]
        );
    }
}
